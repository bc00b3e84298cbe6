//! Math challenge: five timed arithmetic rounds.
//!
//! Each round shows four buttons and a 10 s clock. Every correct answer adds 0.5x. The first
//! miss or timeout ends the run and pays `bet × 0.5 × correct`; five correct answers pay 2.5x.

use super::{
    apply_multiplier, ensure_initiator, logging, questions, ArcadeGame, GameAction, GameError,
    GameResult, GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const ROUNDS: u32 = 5;
pub const ROUND_TIMEOUT_MS: u64 = 10_000;
pub const STEP_MULTIPLIER: u64 = 5_000;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MathChallengeState {
    pub round: u32,
    pub correct: u32,
    pub question: questions::Question,
    pub finished: bool,
}

impl MathChallengeState {
    pub fn multiplier_bps(&self) -> u64 {
        STEP_MULTIPLIER * self.correct as u64
    }
}

fn state_mut(session: &mut GameSession) -> Result<&mut MathChallengeState, GameError> {
    match &mut session.state {
        GameState::MathChallenge(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

fn end_run(state: &mut MathChallengeState, bet: u64, reason: &str) -> GameResult {
    state.finished = true;
    let payout = apply_multiplier(bet, state.multiplier_bps());
    let logs = logging::single(json!({
        "reason": reason,
        "correct": state.correct,
        "payout": payout,
    }));
    if payout > 0 {
        GameResult::Win(payout, logs)
    } else {
        GameResult::Loss(logs)
    }
}

pub struct MathChallenge;

impl ArcadeGame for MathChallenge {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let question = questions::arithmetic(rng, questions::Difficulty::Normal);
        let log = logging::single(json!({"round": 1, "prompt": question.prompt}));
        session.state = GameState::MathChallenge(MathChallengeState {
            round: 1,
            question,
            ..Default::default()
        });
        session.arm_timer(ROUND_TIMEOUT_MS);
        Ok(GameResult::Continue(log))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let choice = action
            .indexed("answer", questions::OPTION_COUNT as u8)
            .ok_or(GameError::InvalidAction)?;
        let bet = session.bet;
        let state = state_mut(session)?;
        if state.finished {
            return Err(GameError::GameAlreadyComplete);
        }

        if !state.question.is_correct(choice) {
            return Ok(end_run(state, bet, "miss"));
        }
        state.correct += 1;
        if state.round >= ROUNDS {
            return Ok(end_run(state, bet, "complete"));
        }
        state.round += 1;
        state.question = questions::arithmetic(rng, questions::Difficulty::Normal);
        let log = logging::single(json!({
            "round": state.round,
            "prompt": state.question.prompt,
            "multiplier_bps": state.multiplier_bps(),
        }));
        session.arm_timer(ROUND_TIMEOUT_MS);
        Ok(GameResult::Continue(log))
    }

    fn on_timeout(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        let bet = session.bet;
        let state = state_mut(session)?;
        if state.finished {
            return Err(GameError::GameAlreadyComplete);
        }
        Ok(end_run(state, bet, "timeout"))
    }
}
