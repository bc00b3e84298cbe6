//! Ledger gateway.
//!
//! The engine only talks to persistence through [`Ledger`]. `debit` is the escrow primitive: a
//! single check-and-decrement that either takes the whole stake or nothing.

use arcade_types::{GameType, PlayerId, STARTING_BALANCE, XP_PER_LEVEL_STEP};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tracing::debug;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("balance overflow")]
    Overflow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    GamesPlayed,
    GamesWon,
    CoinsWagered,
    CoinsWon,
    VoiceMinutes,
}

/// Per-player, per-game counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub played: u64,
    pub won: u64,
    pub drawn: u64,
    pub wagered: u64,
    pub paid_out: u64,
}

/// How a finished game ended for one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Drawn,
    Lost,
}

pub trait Ledger {
    fn balance(&self, player: PlayerId) -> u64;

    /// Take `amount` from `player` atomically, or fail without touching the balance.
    fn debit(&mut self, player: PlayerId, amount: u64) -> Result<u64, LedgerError>;

    fn credit(&mut self, player: PlayerId, amount: u64) -> Result<u64, LedgerError>;

    fn record_game_result(
        &mut self,
        player: PlayerId,
        game_type: GameType,
        outcome: GameOutcome,
        wagered: u64,
        paid_out: u64,
    );

    fn record_progress(&mut self, player: PlayerId, kind: ProgressKind, amount: u64);

    /// Grant XP and return the resulting level.
    fn add_xp(&mut self, player: PlayerId, amount: u64) -> u32;
}

pub fn level_for_xp(xp: u64) -> u32 {
    (xp / XP_PER_LEVEL_STEP).isqrt() as u32
}

/// Player profile kept by [`MemoryLedger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub balance: u64,
    pub xp: u64,
    pub level: u32,
    pub stats: HashMap<GameType, GameStats>,
    pub progress: HashMap<ProgressKind, u64>,
}

impl Profile {
    fn new(balance: u64) -> Self {
        Self {
            balance,
            xp: 0,
            level: 0,
            stats: HashMap::new(),
            progress: HashMap::new(),
        }
    }
}

/// In-process ledger. Unknown players start with `starting_balance`.
#[derive(Debug)]
pub struct MemoryLedger {
    starting_balance: u64,
    profiles: HashMap<PlayerId, Profile>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(STARTING_BALANCE)
    }
}

impl MemoryLedger {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            starting_balance,
            profiles: HashMap::new(),
        }
    }

    pub fn profile(&self, player: PlayerId) -> Option<&Profile> {
        self.profiles.get(&player)
    }

    pub fn stats(&self, player: PlayerId, game_type: GameType) -> GameStats {
        self.profiles
            .get(&player)
            .and_then(|p| p.stats.get(&game_type).copied())
            .unwrap_or_default()
    }

    pub fn progress(&self, player: PlayerId, kind: ProgressKind) -> u64 {
        self.profiles
            .get(&player)
            .and_then(|p| p.progress.get(&kind).copied())
            .unwrap_or(0)
    }

    /// Overwrite a balance (admin grants, tests).
    pub fn set_balance(&mut self, player: PlayerId, balance: u64) {
        self.profile_mut(player).balance = balance;
    }

    fn profile_mut(&mut self, player: PlayerId) -> &mut Profile {
        let starting_balance = self.starting_balance;
        self.profiles
            .entry(player)
            .or_insert_with(|| Profile::new(starting_balance))
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, player: PlayerId) -> u64 {
        self.profiles
            .get(&player)
            .map_or(self.starting_balance, |p| p.balance)
    }

    fn debit(&mut self, player: PlayerId, amount: u64) -> Result<u64, LedgerError> {
        let profile = self.profile_mut(player);
        if profile.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                have: profile.balance,
                need: amount,
            });
        }
        profile.balance -= amount;
        debug!(player = ?player, amount, balance = profile.balance, "debit");
        Ok(profile.balance)
    }

    fn credit(&mut self, player: PlayerId, amount: u64) -> Result<u64, LedgerError> {
        let profile = self.profile_mut(player);
        profile.balance = profile
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        debug!(player = ?player, amount, balance = profile.balance, "credit");
        Ok(profile.balance)
    }

    fn record_game_result(
        &mut self,
        player: PlayerId,
        game_type: GameType,
        outcome: GameOutcome,
        wagered: u64,
        paid_out: u64,
    ) {
        let stats = self.profile_mut(player).stats.entry(game_type).or_default();
        stats.played += 1;
        match outcome {
            GameOutcome::Won => stats.won += 1,
            GameOutcome::Drawn => stats.drawn += 1,
            GameOutcome::Lost => {}
        }
        stats.wagered = stats.wagered.saturating_add(wagered);
        stats.paid_out = stats.paid_out.saturating_add(paid_out);
    }

    fn record_progress(&mut self, player: PlayerId, kind: ProgressKind, amount: u64) {
        let counter = self.profile_mut(player).progress.entry(kind).or_insert(0);
        *counter = counter.saturating_add(amount);
    }

    fn add_xp(&mut self, player: PlayerId, amount: u64) -> u32 {
        let profile = self.profile_mut(player);
        profile.xp = profile.xp.saturating_add(amount);
        let level = level_for_xp(profile.xp);
        if level > profile.level {
            debug!(player = ?player, level, xp = profile.xp, "level up");
        }
        profile.level = level;
        level
    }
}
