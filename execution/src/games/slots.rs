//! Slots: `start` spins three weighted reels and resolves immediately.

use super::{
    apply_multiplier, logging, ArcadeGame, GameAction, GameError, GameResult, GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Cherry,
    Lemon,
    Bell,
    Star,
    Seven,
}

const SYMBOLS: [Symbol; 5] = [
    Symbol::Cherry,
    Symbol::Lemon,
    Symbol::Bell,
    Symbol::Star,
    Symbol::Seven,
];
const WEIGHTS: [u32; 5] = [35, 30, 20, 10, 5];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SlotsState {
    pub reels: Vec<Symbol>,
    pub multiplier_bps: u64,
    pub payout: u64,
}

/// Payout multiplier (bps) for a spin; 0 is a loss.
pub fn multiplier_for(reels: &[Symbol; 3]) -> u64 {
    let [a, b, c] = *reels;
    if a == b && b == c {
        return match a {
            Symbol::Seven => 200_000,
            Symbol::Star => 100_000,
            Symbol::Bell => 50_000,
            _ => 30_000,
        };
    }
    let cherries = reels.iter().filter(|s| **s == Symbol::Cherry).count();
    if cherries == 2 {
        15_000
    } else {
        0
    }
}

fn spin(rng: &mut GameRng) -> Symbol {
    rng.weighted_index(&WEIGHTS)
        .map(|idx| SYMBOLS[idx])
        .unwrap_or(Symbol::Cherry)
}

pub struct Slots;

impl ArcadeGame for Slots {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let reels = [spin(rng), spin(rng), spin(rng)];
        let multiplier_bps = multiplier_for(&reels);
        let payout = apply_multiplier(session.bet, multiplier_bps);
        session.state = GameState::Slots(SlotsState {
            reels: reels.to_vec(),
            multiplier_bps,
            payout,
        });

        let logs = logging::single(json!({
            "reels": reels,
            "multiplier_bps": multiplier_bps,
            "payout": payout,
        }));
        Ok(if multiplier_bps > 0 {
            GameResult::Win(payout, logs)
        } else {
            GameResult::Loss(logs)
        })
    }

    fn apply_action(
        _session: &mut GameSession,
        _actor: PlayerId,
        _action: &GameAction,
        _rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        // Resolved at start.
        Err(GameError::GameAlreadyComplete)
    }
}
