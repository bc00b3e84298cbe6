//! Number guess: find a secret in 1..=100 within seven attempts.
//!
//! Each miss returns a `higher` / `lower` hint. A hit on attempt `k` pays
//! `PAYOUT_LADDER[k - 1]`.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const MAX_NUMBER: u32 = 100;
pub const MAX_ATTEMPTS: usize = 7;
pub const PAYOUT_LADDER: [u64; MAX_ATTEMPTS] =
    [50_000, 40_000, 30_000, 25_000, 20_000, 15_000, 12_000];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    Higher,
    Lower,
    Correct,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NumberGuessState {
    #[serde(skip)]
    pub secret: u32,
    pub guesses: Vec<(u32, Hint)>,
    pub solved: bool,
}

impl NumberGuessState {
    pub fn attempts_left(&self) -> usize {
        MAX_ATTEMPTS.saturating_sub(self.guesses.len())
    }
}

pub struct NumberGuess;

impl ArcadeGame for NumberGuess {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::NumberGuess(NumberGuessState {
            secret: rng.range_inclusive(1, MAX_NUMBER),
            ..Default::default()
        });
        Ok(GameResult::Continue(logging::single(json!({
            "attempts": MAX_ATTEMPTS,
        }))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        _rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        if action.token != "guess" {
            return Err(GameError::InvalidAction);
        }
        let guess: u32 = action.value()?.parse().map_err(|_| GameError::InvalidMove)?;
        if !(1..=MAX_NUMBER).contains(&guess) {
            return Err(GameError::InvalidMove);
        }
        let bet = session.bet;
        let GameState::NumberGuess(state) = &mut session.state else {
            return Err(GameError::InvalidState);
        };
        if state.solved || state.attempts_left() == 0 {
            return Err(GameError::GameAlreadyComplete);
        }

        let hint = match guess.cmp(&state.secret) {
            std::cmp::Ordering::Less => Hint::Higher,
            std::cmp::Ordering::Greater => Hint::Lower,
            std::cmp::Ordering::Equal => Hint::Correct,
        };
        state.guesses.push((guess, hint));
        let attempt = state.guesses.len();
        let log = |payout: u64| {
            logging::single(json!({
                "attempt": attempt,
                "guess": guess,
                "hint": hint,
                "payout": payout,
            }))
        };

        if hint == Hint::Correct {
            state.solved = true;
            let payout = apply_multiplier(bet, PAYOUT_LADDER[attempt - 1]);
            return Ok(GameResult::Win(payout, log(payout)));
        }
        if state.attempts_left() == 0 {
            return Ok(GameResult::Loss(logging::single(json!({
                "attempt": attempt,
                "guess": guess,
                "secret": state.secret,
            }))));
        }
        Ok(GameResult::Continue(log(0)))
    }
}
