//! Shared challenge protocol for head-to-head games.
//!
//! A challenge opens in the waiting phase with a 60 s accept window. Any other player may
//! `accept` (the orchestrator seats and escrows them first); the challenger may `cancel`. An
//! unanswered challenge is cancelled by its timer and every stake is returned.

use super::{logging, GameError, GameResult};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde_json::json;

pub const ACCEPT_TIMEOUT_MS: u64 = 60_000;

pub const ACCEPT: &str = "accept";
pub const CANCEL: &str = "cancel";

/// Arm the accept window and describe the open challenge.
pub fn open(session: &mut GameSession) -> GameResult {
    session.arm_timer(ACCEPT_TIMEOUT_MS);
    GameResult::Continue(logging::single(json!({
        "phase": "waiting",
        "challenger": session.initiator().map(|p| p.0),
        "bet": session.bet,
    })))
}

/// Validate an `accept` from `actor`, who must already be seated second.
pub fn accept(session: &GameSession, actor: PlayerId) -> Result<PlayerId, GameError> {
    let challenger = session.initiator().ok_or(GameError::InvalidState)?;
    if actor == challenger {
        return Err(GameError::SelfJoin);
    }
    match session.players.get(1) {
        Some(opponent) if *opponent == actor => Ok(challenger),
        _ => Err(GameError::NotParticipant),
    }
}

/// Withdraw a challenge before anyone accepts it.
pub fn cancel(session: &GameSession, actor: PlayerId) -> Result<GameResult, GameError> {
    if session.initiator() != Some(actor) {
        return Err(GameError::NotParticipant);
    }
    Ok(GameResult::Cancelled(logging::single(json!({
        "phase": "cancelled",
        "reason": "withdrawn",
    }))))
}

/// The accept window elapsed.
pub fn expire() -> GameResult {
    GameResult::Cancelled(logging::single(json!({
        "phase": "cancelled",
        "reason": "expired",
    })))
}

/// Seat index of `actor`, or `NotParticipant`.
pub fn seat(session: &GameSession, actor: PlayerId) -> Result<usize, GameError> {
    session
        .players
        .iter()
        .position(|p| *p == actor)
        .ok_or(GameError::NotParticipant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::GameType;

    #[test]
    fn test_open_arms_accept_window() {
        let mut session = test_session(GameType::Duel, 50);
        assert!(matches!(open(&mut session), GameResult::Continue(_)));
        assert_eq!(session.pending_timer, Some(ACCEPT_TIMEOUT_MS));
    }

    #[test]
    fn test_accept_rules() {
        let mut session = test_session(GameType::Duel, 50);
        assert_eq!(accept(&session, PlayerId(1)), Err(GameError::SelfJoin));
        assert_eq!(accept(&session, PlayerId(2)), Err(GameError::NotParticipant));
        session.players.push(PlayerId(2));
        assert_eq!(accept(&session, PlayerId(2)), Ok(PlayerId(1)));
        assert_eq!(accept(&session, PlayerId(3)), Err(GameError::NotParticipant));
    }

    #[test]
    fn test_only_challenger_cancels() {
        let session = test_session(GameType::QuizBattle, 50);
        assert_eq!(cancel(&session, PlayerId(2)), Err(GameError::NotParticipant));
        assert!(matches!(
            cancel(&session, PlayerId(1)),
            Ok(GameResult::Cancelled(_))
        ));
    }
}
