//! Coinflip.
//!
//! `start` waits for a call. Actions: `heads` / `tails`. A correct call pays 1.9x.

use super::{
    ensure_initiator, logging, apply_multiplier, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

/// Payout for a correct call, in basis points.
pub const WIN_MULTIPLIER: u64 = 19_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Heads,
    Tails,
}

impl Side {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "heads" => Some(Self::Heads),
            "tails" => Some(Self::Tails),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CoinFlipState {
    pub call: Option<Side>,
    pub landed: Option<Side>,
    pub payout: u64,
}

fn state_mut(session: &mut GameSession) -> Result<&mut CoinFlipState, GameError> {
    match &mut session.state {
        GameState::CoinFlip(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

pub struct CoinFlip;

impl ArcadeGame for CoinFlip {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::CoinFlip(CoinFlipState::default());
        Ok(GameResult::Continue(logging::single(json!({"phase": "choose"}))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let call = Side::parse(&action.token).ok_or(GameError::InvalidAction)?;
        let bet = session.bet;
        let state = state_mut(session)?;
        if state.landed.is_some() {
            return Err(GameError::GameAlreadyComplete);
        }

        let landed = if rng.next_below(2) == 0 {
            Side::Heads
        } else {
            Side::Tails
        };
        state.call = Some(call);
        state.landed = Some(landed);

        let logs = |payout: u64| {
            logging::single(json!({"call": call, "landed": landed, "payout": payout}))
        };
        if call == landed {
            state.payout = apply_multiplier(bet, WIN_MULTIPLIER);
            Ok(GameResult::Win(state.payout, logs(state.payout)))
        } else {
            Ok(GameResult::Loss(logs(0)))
        }
    }
}
