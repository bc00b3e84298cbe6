//! Higher or lower.
//!
//! A card is dealt (with replacement). Each correct `higher` / `lower` guess multiplies the pot by
//! `13 / winning_ranks`; equal rank is a push that leaves the streak alone. `cashout` is legal
//! once the streak is at least one. Higher at King and Lower at Ace are invalid.

use super::{
    apply_multiplier, cards, ensure_initiator, logging, ArcadeGame, GameAction, GameError,
    GameResult, GameRng, GameState, BASE_MULTIPLIER,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guess {
    Higher,
    Lower,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HiLoState {
    pub current_card: u8,
    pub streak: u32,
    pub multiplier_bps: u64,
    pub history: Vec<u8>,
}

impl Default for HiLoState {
    fn default() -> Self {
        Self {
            current_card: 0,
            streak: 0,
            multiplier_bps: BASE_MULTIPLIER,
            history: Vec::new(),
        }
    }
}

/// Multiplier (bps) for a correct guess from `rank` (1..=13). `None` if the guess cannot win.
pub fn step_multiplier(rank: u8, guess: Guess) -> Option<u64> {
    let winning_ranks = match guess {
        Guess::Higher => 13u64.checked_sub(rank as u64)?,
        Guess::Lower => (rank as u64).checked_sub(1)?,
    };
    if winning_ranks == 0 {
        return None;
    }
    Some(13 * BASE_MULTIPLIER / winning_ranks)
}

pub struct HiLo;

impl ArcadeGame for HiLo {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let card = rng.draw_card();
        session.state = GameState::HigherLower(HiLoState {
            current_card: card,
            history: vec![card],
            ..Default::default()
        });
        Ok(GameResult::Continue(logging::single(json!({
            "card": cards::card_label(card),
        }))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let bet = session.bet;
        let GameState::HigherLower(state) = &mut session.state else {
            return Err(GameError::InvalidState);
        };

        let guess = match action.token.as_str() {
            "higher" => Guess::Higher,
            "lower" => Guess::Lower,
            "cashout" => {
                if state.streak == 0 {
                    return Err(GameError::InvalidMove);
                }
                let payout = apply_multiplier(bet, state.multiplier_bps);
                return Ok(GameResult::Win(
                    payout,
                    logging::single(json!({
                        "action": "cashout",
                        "streak": state.streak,
                        "multiplier_bps": state.multiplier_bps,
                        "payout": payout,
                    })),
                ));
            }
            _ => return Err(GameError::InvalidAction),
        };

        let rank = cards::card_rank_one_based(state.current_card);
        let step = step_multiplier(rank, guess).ok_or(GameError::InvalidMove)?;

        let next = rng.draw_card();
        let next_rank = cards::card_rank_one_based(next);
        state.current_card = next;
        state.history.push(next);

        let log = |outcome: &str, state: &HiLoState| {
            logging::single(json!({
                "guess": guess,
                "card": cards::card_label(next),
                "outcome": outcome,
                "streak": state.streak,
                "multiplier_bps": state.multiplier_bps,
            }))
        };

        if next_rank == rank {
            return Ok(GameResult::Continue(log("push", state)));
        }
        let correct = match guess {
            Guess::Higher => next_rank > rank,
            Guess::Lower => next_rank < rank,
        };
        if !correct {
            return Ok(GameResult::Loss(log("miss", state)));
        }

        state.streak += 1;
        state.multiplier_bps = (state.multiplier_bps as u128 * step as u128
            / BASE_MULTIPLIER as u128)
            .try_into()
            .unwrap_or(u64::MAX);
        Ok(GameResult::Continue(log("hit", state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::GameType;

    fn session_on(card: u8) -> GameSession {
        let mut session = test_session(GameType::HigherLower, 100);
        HiLo::start(&mut session, &mut GameRng::from_values([card as u32])).unwrap();
        session
    }

    fn state(session: &GameSession) -> &HiLoState {
        match &session.state {
            GameState::HigherLower(state) => state,
            _ => panic!("wrong state"),
        }
    }

    #[test]
    fn test_step_multiplier() {
        // From a 2, eleven ranks are higher.
        assert_eq!(step_multiplier(2, Guess::Higher), Some(130_000 / 11));
        assert_eq!(step_multiplier(7, Guess::Lower), Some(130_000 / 6));
        assert_eq!(step_multiplier(13, Guess::Higher), None);
        assert_eq!(step_multiplier(1, Guess::Lower), None);
    }

    #[test]
    fn test_cannot_guess_higher_than_king() {
        let mut session = session_on(12);
        let mut rng = GameRng::from_values([0]);
        assert_eq!(
            HiLo::apply_action(&mut session, PlayerId(1), &GameAction::new("higher"), &mut rng),
            Err(GameError::InvalidMove)
        );
    }

    #[test]
    fn test_cashout_requires_streak() {
        let mut session = session_on(5);
        let mut rng = GameRng::from_values([]);
        assert_eq!(
            HiLo::apply_action(&mut session, PlayerId(1), &GameAction::new("cashout"), &mut rng),
            Err(GameError::InvalidMove)
        );
    }

    #[test]
    fn test_streak_then_cashout() {
        // Seven of spades (rank 7), next card Ten (index 9).
        let mut session = session_on(6);
        let mut rng = GameRng::from_values([9]);
        let result =
            HiLo::apply_action(&mut session, PlayerId(1), &GameAction::new("higher"), &mut rng)
                .unwrap();
        assert!(matches!(result, GameResult::Continue(_)));
        assert_eq!(state(&session).streak, 1);
        assert_eq!(state(&session).multiplier_bps, 130_000 / 6);

        let result =
            HiLo::apply_action(&mut session, PlayerId(1), &GameAction::new("cashout"), &mut rng)
                .unwrap();
        assert!(matches!(result, GameResult::Win(216, _)));
    }

    #[test]
    fn test_same_rank_pushes() {
        let mut session = session_on(6);
        // Seven of hearts.
        let mut rng = GameRng::from_values([19]);
        let result =
            HiLo::apply_action(&mut session, PlayerId(1), &GameAction::new("lower"), &mut rng)
                .unwrap();
        assert!(matches!(result, GameResult::Continue(_)));
        assert_eq!(state(&session).streak, 0);
        assert_eq!(state(&session).multiplier_bps, BASE_MULTIPLIER);
    }

    #[test]
    fn test_wrong_guess_loses() {
        let mut session = session_on(6);
        let mut rng = GameRng::from_values([1]);
        let result =
            HiLo::apply_action(&mut session, PlayerId(1), &GameAction::new("higher"), &mut rng)
                .unwrap();
        assert!(matches!(result, GameResult::Loss(_)));
    }
}
