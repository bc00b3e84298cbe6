//! Single-zero roulette.
//!
//! Actions: `red`, `black`, `even`, `odd`, `low`, `high` (2x including stake) and `green`
//! (straight up on zero, 36x). Zero loses every even-money bet.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouletteBet {
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
    Green,
}

impl RouletteBet {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "red" => Self::Red,
            "black" => Self::Black,
            "even" => Self::Even,
            "odd" => Self::Odd,
            "low" => Self::Low,
            "high" => Self::High,
            "green" => Self::Green,
            _ => return None,
        })
    }

    fn wins(self, number: u8) -> bool {
        if number == 0 {
            return self == Self::Green;
        }
        match self {
            Self::Red => is_red(number),
            Self::Black => !is_red(number),
            Self::Even => number % 2 == 0,
            Self::Odd => number % 2 == 1,
            Self::Low => number <= 18,
            Self::High => number >= 19,
            Self::Green => false,
        }
    }

    /// Total return including stake, in bps.
    fn multiplier(self) -> u64 {
        match self {
            Self::Green => 360_000,
            _ => 20_000,
        }
    }
}

pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouletteState {
    pub bet: Option<RouletteBet>,
    pub number: Option<u8>,
    pub payout: u64,
}

pub struct Roulette;

impl ArcadeGame for Roulette {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::Roulette(RouletteState::default());
        Ok(GameResult::Continue(logging::single(json!({"phase": "place_bet"}))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let bet_kind = RouletteBet::parse(&action.token).ok_or(GameError::InvalidAction)?;
        let stake = session.bet;
        let GameState::Roulette(state) = &mut session.state else {
            return Err(GameError::InvalidState);
        };
        if state.number.is_some() {
            return Err(GameError::GameAlreadyComplete);
        }

        let number = rng.spin_roulette();
        state.bet = Some(bet_kind);
        state.number = Some(number);
        let won = bet_kind.wins(number);
        if won {
            state.payout = apply_multiplier(stake, bet_kind.multiplier());
        }
        let logs = logging::single(json!({
            "bet": bet_kind,
            "number": number,
            "payout": state.payout,
        }));
        Ok(if won {
            GameResult::Win(state.payout, logs)
        } else {
            GameResult::Loss(logs)
        })
    }
}
