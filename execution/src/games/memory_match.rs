//! Memory match: six pairs face down.
//!
//! `flip-N` turns a card (1..=12). Two flips make a move. A mismatched pair stays visible until
//! the next flip. Clearing the board pays by moves used: 3x within 8, 2x within 10, 1.5x within
//! 12. Using all twelve moves without clearing loses the stake.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const CARDS: usize = 12;
pub const MAX_MOVES: u32 = 12;

/// `(max moves, multiplier bps)`, checked in order.
const PAYOUTS: [(u32, u64); 3] = [(8, 30_000), (10, 20_000), (12, 15_000)];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MemoryMatchState {
    #[serde(skip)]
    pub deck: Vec<u8>,
    /// Face shown for each slot; `None` while face down.
    pub visible: Vec<Option<u8>>,
    pub matched: Vec<bool>,
    /// Face-up cards of the current or last unresolved move.
    pub flipped: Vec<usize>,
    pub moves: u32,
    pub finished: bool,
}

/// Multiplier (bps) for clearing the board in `moves`.
pub fn payout_multiplier(moves: u32) -> u64 {
    PAYOUTS
        .iter()
        .find(|(limit, _)| moves <= *limit)
        .map(|(_, bps)| *bps)
        .unwrap_or(0)
}

fn state_mut(session: &mut GameSession) -> Result<&mut MemoryMatchState, GameError> {
    match &mut session.state {
        GameState::MemoryMatch(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

pub struct MemoryMatch;

impl ArcadeGame for MemoryMatch {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let mut deck: Vec<u8> = (0..CARDS as u8).map(|i| i / 2).collect();
        rng.shuffle(&mut deck);
        session.state = GameState::MemoryMatch(MemoryMatchState {
            deck,
            visible: vec![None; CARDS],
            matched: vec![false; CARDS],
            ..Default::default()
        });
        Ok(GameResult::Continue(logging::single(json!({
            "pairs": CARDS / 2,
            "max_moves": MAX_MOVES,
        }))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        _rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let slot = action
            .indexed("flip", CARDS as u8)
            .ok_or(GameError::InvalidAction)? as usize
            - 1;
        let bet = session.bet;
        let state = state_mut(session)?;
        if state.finished {
            return Err(GameError::GameAlreadyComplete);
        }
        if state.deck.len() != CARDS {
            return Err(GameError::InvalidState);
        }

        let pending_mismatch = state.flipped.len() == 2;
        if state.matched[slot] || (!pending_mismatch && state.flipped.contains(&slot)) {
            return Err(GameError::InvalidMove);
        }
        // A resolved mismatch is turned back over before the next flip.
        if pending_mismatch {
            for hidden in state.flipped.drain(..) {
                state.visible[hidden] = None;
            }
        }

        state.visible[slot] = Some(state.deck[slot]);
        state.flipped.push(slot);
        if state.flipped.len() < 2 {
            return Ok(GameResult::Continue(logging::single(json!({
                "flip": slot + 1,
                "face": state.deck[slot],
            }))));
        }

        state.moves += 1;
        let (first, second) = (state.flipped[0], state.flipped[1]);
        let matched = state.deck[first] == state.deck[second];
        if matched {
            state.matched[first] = true;
            state.matched[second] = true;
            state.flipped.clear();
        }
        let log = json!({
            "flip": slot + 1,
            "face": state.deck[slot],
            "move": state.moves,
            "matched": matched,
        });

        if state.matched.iter().all(|m| *m) {
            state.finished = true;
            let payout = apply_multiplier(bet, payout_multiplier(state.moves));
            return Ok(GameResult::Win(
                payout,
                vec![
                    logging::entry(log),
                    logging::entry(json!({"moves": state.moves, "payout": payout})),
                ],
            ));
        }
        if state.moves >= MAX_MOVES {
            state.finished = true;
            state.visible = state.deck.iter().map(|face| Some(*face)).collect();
            return Ok(GameResult::Loss(vec![logging::entry(log)]));
        }
        Ok(GameResult::Continue(vec![logging::entry(log)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::GameType;

    /// Pairs laid out side by side: (1,2), (3,4), ...
    fn ordered() -> GameSession {
        let mut session = test_session(GameType::MemoryMatch, 100);
        let deck: Vec<u8> = (0..CARDS as u8).map(|i| i / 2).collect();
        session.state = GameState::MemoryMatch(MemoryMatchState {
            deck,
            visible: vec![None; CARDS],
            matched: vec![false; CARDS],
            ..Default::default()
        });
        session
    }

    fn flip(session: &mut GameSession, n: usize) -> Result<GameResult, GameError> {
        MemoryMatch::apply_action(
            session,
            PlayerId(1),
            &GameAction::new(format!("flip-{n}")),
            &mut GameRng::from_values([]),
        )
    }

    #[test]
    fn test_payout_tiers() {
        assert_eq!(payout_multiplier(6), 30_000);
        assert_eq!(payout_multiplier(8), 30_000);
        assert_eq!(payout_multiplier(9), 20_000);
        assert_eq!(payout_multiplier(12), 15_000);
        assert_eq!(payout_multiplier(13), 0);
    }

    #[test]
    fn test_perfect_game_pays_triple() {
        let mut session = ordered();
        let mut last = None;
        for pair in 0..CARDS / 2 {
            flip(&mut session, pair * 2 + 1).unwrap();
            last = Some(flip(&mut session, pair * 2 + 2).unwrap());
        }
        assert!(matches!(last, Some(GameResult::Win(300, _))));
    }

    #[test]
    fn test_mismatch_hidden_on_next_flip() {
        let mut session = ordered();
        flip(&mut session, 1).unwrap();
        flip(&mut session, 3).unwrap();
        {
            let GameState::MemoryMatch(state) = &session.state else {
                panic!("wrong state");
            };
            assert_eq!(state.visible[0], Some(0));
            assert_eq!(state.visible[2], Some(1));
            assert_eq!(state.moves, 1);
        }
        flip(&mut session, 5).unwrap();
        let GameState::MemoryMatch(state) = &session.state else {
            panic!("wrong state");
        };
        assert_eq!(state.visible[0], None);
        assert_eq!(state.visible[2], None);
        assert_eq!(state.visible[4], Some(2));
    }

    #[test]
    fn test_cannot_flip_matched_or_same_card() {
        let mut session = ordered();
        flip(&mut session, 1).unwrap();
        assert_eq!(flip(&mut session, 1), Err(GameError::InvalidMove));
        flip(&mut session, 2).unwrap();
        assert_eq!(flip(&mut session, 2), Err(GameError::InvalidMove));
    }

    #[test]
    fn test_running_out_of_moves_loses() {
        let mut session = ordered();
        let mut last = None;
        for _ in 0..MAX_MOVES {
            flip(&mut session, 1).unwrap();
            last = Some(flip(&mut session, 3).unwrap());
        }
        assert!(matches!(last, Some(GameResult::Loss(_))));
        assert_eq!(flip(&mut session, 5), Err(GameError::GameAlreadyComplete));
    }
}
