//! Live game sessions.
//!
//! The [`SessionRegistry`] owns every [`GameSession`] and indexes them by id and by player. It
//! enforces the one-active-session rule itself: `create` and `join` refuse any player who
//! already sits in a non-finished session.

use crate::games::GameState;
use arcade_types::{GameType, GuildId, PlayerId, SessionId, SESSION_IDLE_MS, SESSION_RETENTION_MS};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("player {0} already has an active game")]
    PlayerBusy(PlayerId),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("session {0} already finished")]
    SessionFinished(SessionId),
    #[error("session {0} is full")]
    SessionFull(SessionId),
}

/// One in-progress or finished game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    pub id: SessionId,
    pub game_type: GameType,
    /// Ordered participants; index 0 is the initiator.
    pub players: Vec<PlayerId>,
    /// Stake escrowed from each participant.
    pub bet: u64,
    /// Participants whose stake is debited and not yet settled.
    pub escrowed: Vec<PlayerId>,
    pub state: GameState,
    /// Round generation; bumped on every committed transition.
    pub generation: u64,
    /// Committed player actions.
    pub moves: u32,
    pub guild: Option<GuildId>,
    pub started_at: u64,
    pub last_update: u64,
    pub finished_at: Option<u64>,
    pub finished: bool,
    /// Countdown requested by the last transition, consumed by the orchestrator.
    pub pending_timer: Option<u64>,
}

impl GameSession {
    pub fn new(
        id: SessionId,
        game_type: GameType,
        players: Vec<PlayerId>,
        bet: u64,
        guild: Option<GuildId>,
        now: u64,
    ) -> Self {
        Self {
            id,
            game_type,
            players,
            bet,
            escrowed: Vec::new(),
            state: GameState::initial(game_type),
            generation: 0,
            moves: 0,
            guild,
            started_at: now,
            last_update: now,
            finished_at: None,
            finished: false,
            pending_timer: None,
        }
    }

    pub fn initiator(&self) -> Option<PlayerId> {
        self.players.first().copied()
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    /// Request a countdown; it fires against the generation produced by this transition.
    pub fn arm_timer(&mut self, duration_ms: u64) {
        self.pending_timer = Some(duration_ms);
    }
}

/// Sessions removed by a sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Finished sessions dropped after the retention window.
    pub purged: Vec<SessionId>,
    /// Live sessions force-finished for inactivity, still carrying their escrow list.
    pub abandoned: Vec<GameSession>,
}

#[derive(Debug)]
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, GameSession>,
    active_by_player: HashMap<PlayerId, SessionId>,
    next_id: u64,
    retention_ms: u64,
    idle_ms: u64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SESSION_RETENTION_MS, SESSION_IDLE_MS)
    }
}

impl SessionRegistry {
    pub fn new(retention_ms: u64, idle_ms: u64) -> Self {
        Self {
            sessions: BTreeMap::new(),
            active_by_player: HashMap::new(),
            next_id: 1,
            retention_ms,
            idle_ms,
        }
    }

    /// Register a new live session.
    pub fn create(
        &mut self,
        game_type: GameType,
        players: Vec<PlayerId>,
        bet: u64,
        guild: Option<GuildId>,
        now: u64,
    ) -> Result<&mut GameSession, RegistryError> {
        if let Some(busy) = players.iter().find(|p| self.active_by_player.contains_key(*p)) {
            return Err(RegistryError::PlayerBusy(*busy));
        }

        let id = SessionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        for player in &players {
            self.active_by_player.insert(*player, id);
        }
        debug!(session_id = %id, game_type = ?game_type, ?players, bet, "session created");
        Ok(self
            .sessions
            .entry(id)
            .or_insert_with(|| GameSession::new(id, game_type, players, bet, guild, now)))
    }

    /// Add a second participant to a live session.
    pub fn join(
        &mut self,
        id: SessionId,
        player: PlayerId,
        max_players: usize,
        now: u64,
    ) -> Result<(), RegistryError> {
        if self.active_by_player.contains_key(&player) {
            return Err(RegistryError::PlayerBusy(player));
        }
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::SessionNotFound(id))?;
        if session.finished {
            return Err(RegistryError::SessionFinished(id));
        }
        if session.players.len() >= max_players {
            return Err(RegistryError::SessionFull(id));
        }
        session.players.push(player);
        session.last_update = now;
        self.active_by_player.insert(player, id);
        Ok(())
    }

    /// Undo a `join` whose escrow or transition failed.
    pub fn leave(&mut self, id: SessionId, player: PlayerId) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.players.retain(|p| *p != player);
        }
        if self.active_by_player.get(&player) == Some(&id) {
            self.active_by_player.remove(&player);
        }
    }

    pub fn get(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut GameSession> {
        self.sessions.get_mut(&id)
    }

    /// Apply `f` to a live session and bump `last_update`. No-op when absent or finished.
    pub fn update<F>(&mut self, id: SessionId, now: u64, f: F) -> bool
    where
        F: FnOnce(&mut GameSession),
    {
        match self.sessions.get_mut(&id) {
            Some(session) if !session.finished => {
                f(session);
                session.last_update = now;
                true
            }
            _ => false,
        }
    }

    /// Replace a live session with a committed working copy.
    pub fn commit(&mut self, session: GameSession) -> Result<(), RegistryError> {
        let id = session.id;
        let slot = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::SessionNotFound(id))?;
        if slot.finished {
            return Err(RegistryError::SessionFinished(id));
        }
        *slot = session;
        Ok(())
    }

    /// Mark a session finished and release its players. Idempotent.
    pub fn finish(&mut self, id: SessionId, now: u64) -> bool {
        let Some(session) = self.sessions.get_mut(&id) else {
            return false;
        };
        if session.finished {
            return false;
        }
        session.finished = true;
        session.finished_at = Some(now);
        session.last_update = now;
        session.pending_timer = None;
        for player in &session.players {
            if self.active_by_player.get(player) == Some(&id) {
                self.active_by_player.remove(player);
            }
        }
        debug!(session_id = %id, "session finished");
        true
    }

    /// Drop a session outright (start failed after escrow).
    pub fn remove(&mut self, id: SessionId) -> Option<GameSession> {
        let session = self.sessions.remove(&id)?;
        for player in &session.players {
            if self.active_by_player.get(player) == Some(&id) {
                self.active_by_player.remove(player);
            }
        }
        Some(session)
    }

    pub fn has_active(&self, player: PlayerId) -> bool {
        self.active_by_player.contains_key(&player)
    }

    pub fn active_of(&self, player: PlayerId, game_type: Option<GameType>) -> Option<&GameSession> {
        let id = self.active_by_player.get(&player)?;
        let session = self.sessions.get(id)?;
        match game_type {
            Some(game_type) if session.game_type != game_type => None,
            _ => Some(session),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.values().filter(|s| !s.finished).count()
    }

    /// Purge expired finished sessions and force-finish idle live ones.
    pub fn sweep(&mut self, now: u64) -> SweepReport {
        let mut report = SweepReport::default();
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| {
                if session.finished {
                    let finished_at = session.finished_at.unwrap_or(session.last_update);
                    now.saturating_sub(finished_at) >= self.retention_ms
                } else {
                    now.saturating_sub(session.last_update) >= self.idle_ms
                }
            })
            .map(|session| session.id)
            .collect();

        for id in expired {
            let Some(mut session) = self.remove(id) else {
                continue;
            };
            if session.finished {
                report.purged.push(id);
            } else {
                warn!(
                    session_id = %id,
                    game_type = ?session.game_type,
                    idle_ms = now.saturating_sub(session.last_update),
                    "abandoned session swept"
                );
                session.finished = true;
                session.finished_at = Some(now);
                report.abandoned.push(session);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    #[test]
    fn test_create_enforces_single_active_session() {
        let mut registry = SessionRegistry::default();
        let first = registry
            .create(GameType::CoinFlip, vec![ALICE], 100, None, 0)
            .unwrap()
            .id;
        assert!(registry.has_active(ALICE));

        let err = registry
            .create(GameType::Dice, vec![ALICE], 100, None, 0)
            .unwrap_err();
        assert_eq!(err, RegistryError::PlayerBusy(ALICE));

        registry.finish(first, 10);
        assert!(!registry.has_active(ALICE));
        assert!(registry
            .create(GameType::Dice, vec![ALICE], 100, None, 10)
            .is_ok());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let mut registry = SessionRegistry::default();
        let a = registry
            .create(GameType::CoinFlip, vec![ALICE], 0, None, 0)
            .unwrap()
            .id;
        let b = registry
            .create(GameType::CoinFlip, vec![BOB], 0, None, 0)
            .unwrap()
            .id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_join_enforces_invariant_and_capacity() {
        let mut registry = SessionRegistry::default();
        let duel = registry
            .create(GameType::Duel, vec![ALICE], 50, None, 0)
            .unwrap()
            .id;
        let other = registry
            .create(GameType::Dice, vec![BOB], 50, None, 0)
            .unwrap()
            .id;

        assert_eq!(
            registry.join(duel, BOB, 2, 1),
            Err(RegistryError::PlayerBusy(BOB))
        );
        registry.finish(other, 2);
        registry.join(duel, BOB, 2, 3).unwrap();
        assert_eq!(registry.active_of(BOB, None).map(|s| s.id), Some(duel));
        assert_eq!(
            registry.join(duel, PlayerId(3), 2, 4),
            Err(RegistryError::SessionFull(duel))
        );
    }

    #[test]
    fn test_leave_releases_joiner() {
        let mut registry = SessionRegistry::default();
        let duel = registry
            .create(GameType::Duel, vec![ALICE], 50, None, 0)
            .unwrap()
            .id;
        registry.join(duel, BOB, 2, 1).unwrap();
        registry.leave(duel, BOB);
        assert!(!registry.has_active(BOB));
        assert_eq!(registry.get(duel).unwrap().players, vec![ALICE]);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut registry = SessionRegistry::default();
        let id = registry
            .create(GameType::CoinFlip, vec![ALICE], 10, None, 0)
            .unwrap()
            .id;
        assert!(registry.finish(id, 5));
        assert!(!registry.finish(id, 9));
        let session = registry.get(id).unwrap();
        assert!(session.finished);
        assert_eq!(session.finished_at, Some(5));
    }

    #[test]
    fn test_update_is_noop_when_finished_or_absent() {
        let mut registry = SessionRegistry::default();
        let id = registry
            .create(GameType::CoinFlip, vec![ALICE], 10, None, 0)
            .unwrap()
            .id;
        assert!(registry.update(id, 3, |s| s.moves += 1));
        assert_eq!(registry.get(id).unwrap().last_update, 3);

        registry.finish(id, 4);
        assert!(!registry.update(id, 5, |s| s.moves += 1));
        assert_eq!(registry.get(id).unwrap().moves, 1);
        assert!(!registry.update(SessionId(999), 5, |s| s.moves += 1));
    }

    #[test]
    fn test_commit_rejects_finished_session() {
        let mut registry = SessionRegistry::default();
        let id = registry
            .create(GameType::CoinFlip, vec![ALICE], 10, None, 0)
            .unwrap()
            .id;
        let mut copy = registry.get(id).unwrap().clone();
        copy.generation = 1;
        registry.finish(id, 1);
        assert_eq!(
            registry.commit(copy),
            Err(RegistryError::SessionFinished(id))
        );
        assert_eq!(registry.get(id).unwrap().generation, 0);
    }

    #[test]
    fn test_active_of_filters_by_game_type() {
        let mut registry = SessionRegistry::default();
        registry
            .create(GameType::TicTacToe, vec![ALICE], 10, None, 0)
            .unwrap();
        assert!(registry.active_of(ALICE, Some(GameType::TicTacToe)).is_some());
        assert!(registry.active_of(ALICE, Some(GameType::Dice)).is_none());
        assert!(registry.active_of(BOB, None).is_none());
    }

    #[test]
    fn test_sweep_purges_finished_after_retention() {
        let mut registry = SessionRegistry::new(1_000, 5_000);
        let id = registry
            .create(GameType::CoinFlip, vec![ALICE], 10, None, 0)
            .unwrap()
            .id;
        registry.finish(id, 100);

        let report = registry.sweep(1_099);
        assert!(report.purged.is_empty());
        assert!(registry.get(id).is_some());

        let report = registry.sweep(1_100);
        assert_eq!(report.purged, vec![id]);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn test_sweep_force_finishes_idle_sessions() {
        let mut registry = SessionRegistry::new(1_000, 5_000);
        let idle = registry
            .create(GameType::Duel, vec![ALICE], 10, None, 0)
            .unwrap()
            .id;
        let busy = registry
            .create(GameType::Dice, vec![BOB], 10, None, 0)
            .unwrap()
            .id;
        registry.update(busy, 4_000, |_| {});

        let report = registry.sweep(5_000);
        assert_eq!(report.abandoned.len(), 1);
        assert_eq!(report.abandoned[0].id, idle);
        assert!(report.abandoned[0].finished);
        assert!(!registry.has_active(ALICE));
        assert!(registry.has_active(BOB));
        assert!(registry.get(busy).is_some());
    }

    #[test]
    fn test_remove_releases_players() {
        let mut registry = SessionRegistry::default();
        let id = registry
            .create(GameType::CoinFlip, vec![ALICE], 10, None, 0)
            .unwrap()
            .id;
        assert!(registry.remove(id).is_some());
        assert!(!registry.has_active(ALICE));
        assert!(registry.is_empty());
    }
}
