//! Dice: pick a face (`pick-1`..`pick-6`), roll a d6, a match pays 5x.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const WIN_MULTIPLIER: u64 = 50_000;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiceState {
    pub pick: Option<u8>,
    pub roll: Option<u8>,
    pub payout: u64,
}

pub struct Dice;

impl ArcadeGame for Dice {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::Dice(DiceState::default());
        Ok(GameResult::Continue(logging::single(json!({"phase": "pick"}))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let pick = action.indexed("pick", 6).ok_or(GameError::InvalidAction)?;
        let bet = session.bet;
        let GameState::Dice(state) = &mut session.state else {
            return Err(GameError::InvalidState);
        };
        if state.roll.is_some() {
            return Err(GameError::GameAlreadyComplete);
        }

        let roll = rng.roll_die();
        state.pick = Some(pick);
        state.roll = Some(roll);
        if pick == roll {
            state.payout = apply_multiplier(bet, WIN_MULTIPLIER);
        }
        let logs = logging::single(json!({"pick": pick, "roll": roll, "payout": state.payout}));
        Ok(if pick == roll {
            GameResult::Win(state.payout, logs)
        } else {
            GameResult::Loss(logs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::GameType;

    #[test]
    fn test_match_pays_five_times() {
        let mut session = test_session(GameType::Dice, 40);
        // raw 3 % 6 = 3 => face 4
        let mut rng = GameRng::from_values([3]);
        let result =
            Dice::apply_action(&mut session, PlayerId(1), &GameAction::new("pick-4"), &mut rng)
                .unwrap();
        assert_eq!(result.outcome_label(), "win");
        assert!(matches!(result, GameResult::Win(200, _)));
    }

    #[test]
    fn test_miss_loses() {
        let mut session = test_session(GameType::Dice, 40);
        let mut rng = GameRng::from_values([0]);
        let result =
            Dice::apply_action(&mut session, PlayerId(1), &GameAction::new("pick-6"), &mut rng)
                .unwrap();
        assert!(matches!(result, GameResult::Loss(_)));
        let GameState::Dice(state) = &session.state else {
            panic!("wrong state");
        };
        assert_eq!(state.roll, Some(1));
    }

    #[test]
    fn test_out_of_range_pick_rejected() {
        let mut session = test_session(GameType::Dice, 40);
        let mut rng = GameRng::from_values([0]);
        for token in ["pick-0", "pick-7", "roll"] {
            assert_eq!(
                Dice::apply_action(&mut session, PlayerId(1), &GameAction::new(token), &mut rng),
                Err(GameError::InvalidAction)
            );
        }
    }
}
