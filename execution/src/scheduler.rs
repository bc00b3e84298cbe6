//! Clocks, countdown timers and recurring presence accrual.
//!
//! Timers are fire-and-forget: each one captures `(session_id, generation)` and posts a
//! [`TimerFired`] back to the event loop when it elapses. Nothing cancels a superseded timer;
//! the orchestrator drops any firing whose generation no longer matches the session.
//!
//! Presence accrual is different: the interval keeps running until it is explicitly aborted, so
//! the tracker owns one [`AbortHandle`] per player.

use arcade_types::{PlayerId, SessionId, VOICE_ACCRUAL_INTERVAL_MS};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, trace};

/// Millisecond wall clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock advanced by hand in tests.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(AtomicU64::new(start_ms))
    }

    pub fn set(&self, now_ms: u64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) -> u64 {
        self.0.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// A countdown requested by a committed transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub session_id: SessionId,
    pub generation: u64,
    pub delay_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    pub session_id: SessionId,
    pub generation: u64,
}

/// One minute of voice presence elapsed for `player`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccrualTick {
    pub player: PlayerId,
}

/// Where the orchestrator sends timing requests.
pub trait TimerSink {
    fn schedule(&mut self, timer: Timer);

    /// Begin (or restart) recurring accrual for `player`.
    fn start_accrual(&mut self, player: PlayerId);

    /// Stop accrual; returns whether an interval was running.
    fn stop_accrual(&mut self, player: PlayerId) -> bool;
}

/// Per-player recurring intervals with explicit cancellation.
#[derive(Debug)]
pub struct PresenceTracker<E> {
    events: mpsc::UnboundedSender<E>,
    period: Duration,
    intervals: HashMap<PlayerId, AbortHandle>,
}

impl<E> PresenceTracker<E>
where
    E: From<AccrualTick> + Send + 'static,
{
    pub fn new(events: mpsc::UnboundedSender<E>, period_ms: u64) -> Self {
        Self {
            events,
            period: Duration::from_millis(period_ms.max(1)),
            intervals: HashMap::new(),
        }
    }

    pub fn start(&mut self, player: PlayerId) {
        self.stop(player);
        let events = self.events.clone();
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if events.send(AccrualTick { player }.into()).is_err() {
                    break;
                }
            }
        });
        self.intervals.insert(player, task.abort_handle());
        debug!(player = ?player, "presence accrual started");
    }

    pub fn stop(&mut self, player: PlayerId) -> bool {
        match self.intervals.remove(&player) {
            Some(handle) => {
                handle.abort();
                debug!(player = ?player, "presence accrual stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_tracking(&self, player: PlayerId) -> bool {
        self.intervals.contains_key(&player)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl<E> Drop for PresenceTracker<E> {
    fn drop(&mut self) {
        for handle in self.intervals.values() {
            handle.abort();
        }
    }
}

/// Tokio-backed [`TimerSink`] posting events into the host's event channel.
#[derive(Debug)]
pub struct Scheduler<E> {
    events: mpsc::UnboundedSender<E>,
    presence: PresenceTracker<E>,
}

impl<E> Scheduler<E>
where
    E: From<TimerFired> + From<AccrualTick> + Send + 'static,
{
    pub fn new(events: mpsc::UnboundedSender<E>) -> Self {
        Self::with_accrual_period(events, VOICE_ACCRUAL_INTERVAL_MS)
    }

    pub fn with_accrual_period(events: mpsc::UnboundedSender<E>, period_ms: u64) -> Self {
        Self {
            presence: PresenceTracker::new(events.clone(), period_ms),
            events,
        }
    }

    pub fn presence(&self) -> &PresenceTracker<E> {
        &self.presence
    }
}

impl<E> TimerSink for Scheduler<E>
where
    E: From<TimerFired> + From<AccrualTick> + Send + 'static,
{
    fn schedule(&mut self, timer: Timer) {
        let events = self.events.clone();
        trace!(
            session_id = %timer.session_id,
            generation = timer.generation,
            delay_ms = timer.delay_ms,
            "timer scheduled"
        );
        tokio::spawn(async move {
            sleep(Duration::from_millis(timer.delay_ms)).await;
            let _ = events.send(
                TimerFired {
                    session_id: timer.session_id,
                    generation: timer.generation,
                }
                .into(),
            );
        });
    }

    fn start_accrual(&mut self, player: PlayerId) {
        self.presence.start(player);
    }

    fn stop_accrual(&mut self, player: PlayerId) -> bool {
        self.presence.stop(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Event {
        Timer(TimerFired),
        Accrual(AccrualTick),
    }

    impl From<TimerFired> for Event {
        fn from(fired: TimerFired) -> Self {
            Event::Timer(fired)
        }
    }

    impl From<AccrualTick> for Event {
        fn from(tick: AccrualTick) -> Self {
            Event::Accrual(tick)
        }
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now_ms(), 10);
        assert_eq!(clock.advance(5), 15);
        clock.set(100);
        assert_eq!(clock.now_ms(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut scheduler = Scheduler::new(tx);
        scheduler.schedule(Timer {
            session_id: SessionId(3),
            generation: 7,
            delay_ms: 30_000,
        });

        tokio::time::advance(Duration::from_millis(29_000)).await;
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await;
        assert_eq!(
            fired,
            Some(Event::Timer(TimerFired {
                session_id: SessionId(3),
                generation: 7
            }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_accrual_ticks_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut scheduler = Scheduler::with_accrual_period(tx, 60_000);
        let player = PlayerId(9);

        scheduler.start_accrual(player);
        assert!(scheduler.presence().is_tracking(player));
        for _ in 0..2 {
            assert_eq!(
                rx.recv().await,
                Some(Event::Accrual(AccrualTick { player }))
            );
        }

        assert!(scheduler.stop_accrual(player));
        assert!(!scheduler.stop_accrual(player));
        tokio::time::advance(Duration::from_millis(180_000)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_accrual_replaces_interval() {
        let (tx, _rx) = mpsc::unbounded_channel::<Event>();
        let mut tracker = PresenceTracker::new(tx, 60_000);
        tracker.start(PlayerId(1));
        tracker.start(PlayerId(1));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.stop(PlayerId(1)));
        assert!(tracker.is_empty());
    }
}
