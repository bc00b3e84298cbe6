//! Test doubles for the orchestrator's timing and randomness seams.

use crate::games::GameRng;
use crate::orchestrator::RngProvider;
use crate::scheduler::{Timer, TimerSink};
use arcade_types::{PlayerId, SessionId};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Records timing requests instead of spawning tasks.
#[derive(Debug, Default)]
pub struct RecordingTimers {
    pub scheduled: Vec<Timer>,
    pub accruing: HashSet<PlayerId>,
}

impl TimerSink for RecordingTimers {
    fn schedule(&mut self, timer: Timer) {
        self.scheduled.push(timer);
    }

    fn start_accrual(&mut self, player: PlayerId) {
        self.accruing.insert(player);
    }

    fn stop_accrual(&mut self, player: PlayerId) -> bool {
        self.accruing.remove(&player)
    }
}

/// Every session draws from one shared queue of raw values; an empty queue yields zeros.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    queue: Arc<Mutex<VecDeque<u32>>>,
}

impl ScriptedRng {
    pub fn push(&self, values: impl IntoIterator<Item = u32>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.extend(values);
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl RngProvider for ScriptedRng {
    fn rng(&self, _session_id: SessionId, _nonce: u64) -> GameRng {
        GameRng::scripted(self.queue.clone())
    }
}
