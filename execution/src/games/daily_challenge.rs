//! Daily challenge: one hard question a day, free to play.
//!
//! The session carries no stake. A correct answer inside 15 s credits a fixed reward; the
//! 24 h gap between attempts comes from the game's cooldown.

use super::{
    ensure_initiator, logging, questions, ArcadeGame, GameAction, GameError, GameResult, GameRng,
    GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const ANSWER_TIMEOUT_MS: u64 = 15_000;
pub const REWARD: u64 = 500;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DailyChallengeState {
    pub question: questions::Question,
    pub solved: Option<bool>,
}

fn state_mut(session: &mut GameSession) -> Result<&mut DailyChallengeState, GameError> {
    match &mut session.state {
        GameState::DailyChallenge(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

pub struct DailyChallenge;

impl ArcadeGame for DailyChallenge {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let question = questions::arithmetic(rng, questions::Difficulty::Hard);
        let log = logging::single(json!({"prompt": question.prompt, "reward": REWARD}));
        session.state = GameState::DailyChallenge(DailyChallengeState {
            question,
            solved: None,
        });
        session.arm_timer(ANSWER_TIMEOUT_MS);
        Ok(GameResult::Continue(log))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        _rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let choice = action
            .indexed("answer", questions::OPTION_COUNT as u8)
            .ok_or(GameError::InvalidAction)?;
        let state = state_mut(session)?;
        if state.solved.is_some() {
            return Err(GameError::GameAlreadyComplete);
        }
        let correct = state.question.is_correct(choice);
        state.solved = Some(correct);
        let logs = logging::single(json!({
            "correct": correct,
            "answer": state.question.options.get(state.question.answer),
        }));
        Ok(if correct {
            GameResult::Win(REWARD, logs)
        } else {
            GameResult::Loss(logs)
        })
    }

    fn on_timeout(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        let state = state_mut(session)?;
        if state.solved.is_some() {
            return Err(GameError::GameAlreadyComplete);
        }
        state.solved = Some(false);
        Ok(GameResult::Loss(logging::single(json!({"timeout": true}))))
    }
}
