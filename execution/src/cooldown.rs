//! Anti-abuse gate for game starts.
//!
//! Two independent checks run before any money moves:
//! - a sliding-window burst limit on starts per player, and
//! - a per-action cooldown stamped only after a start succeeds.
//!
//! The effective cooldown resolves per guild: an override for the specific game wins over the
//! guild's `"all"` override, which wins over the game's built-in default.

use arcade_types::{
    CooldownOverrides, GameType, GuildId, PlayerId, BURST_WINDOW_MS, COOLDOWN_STAMP_TTL_MS,
    DEFAULT_BURST_LIMIT,
};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Result of a cooldown lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownCheck {
    pub allowed: bool,
    pub remaining_ms: u64,
}

impl CooldownCheck {
    const ALLOWED: Self = Self {
        allowed: true,
        remaining_ms: 0,
    };
}

#[derive(Debug)]
pub struct CooldownGuard {
    burst_limit: usize,
    burst_window_ms: u64,
    overrides: CooldownOverrides,
    /// Recent start timestamps per player, oldest first.
    bursts: HashMap<PlayerId, VecDeque<u64>>,
    /// Last successful use per `(player, action key)`.
    stamps: HashMap<(PlayerId, String), u64>,
}

impl Default for CooldownGuard {
    fn default() -> Self {
        Self::new(DEFAULT_BURST_LIMIT, BURST_WINDOW_MS, CooldownOverrides::default())
    }
}

impl CooldownGuard {
    pub fn new(burst_limit: usize, burst_window_ms: u64, overrides: CooldownOverrides) -> Self {
        Self {
            burst_limit,
            burst_window_ms,
            overrides,
            bursts: HashMap::new(),
            stamps: HashMap::new(),
        }
    }

    pub fn overrides(&self) -> &CooldownOverrides {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut CooldownOverrides {
        &mut self.overrides
    }

    /// Whether `player` may start another game inside the burst window.
    pub fn check_burst_rate(&self, player: PlayerId, now: u64) -> bool {
        let Some(starts) = self.bursts.get(&player) else {
            return true;
        };
        let recent = starts
            .iter()
            .filter(|at| in_window(**at, now, self.burst_window_ms))
            .count();
        recent < self.burst_limit
    }

    pub fn check_cooldown(
        &self,
        player: PlayerId,
        action_key: &str,
        duration_ms: u64,
        now: u64,
    ) -> CooldownCheck {
        let Some(last) = self.stamps.get(&(player, action_key.to_string())) else {
            return CooldownCheck::ALLOWED;
        };
        let ready_at = last.saturating_add(duration_ms);
        if now >= ready_at {
            CooldownCheck::ALLOWED
        } else {
            CooldownCheck {
                allowed: false,
                remaining_ms: ready_at - now,
            }
        }
    }

    /// Stamp a successful start.
    pub fn record(&mut self, player: PlayerId, action_key: &str, now: u64) {
        self.stamps.insert((player, action_key.to_string()), now);
        let starts = self.bursts.entry(player).or_default();
        starts.push_back(now);
        let window = self.burst_window_ms;
        while starts.front().is_some_and(|at| !in_window(*at, now, window)) {
            starts.pop_front();
        }
    }

    /// Cooldown for `game_type` in `guild`, falling back to `default_ms`.
    pub fn effective_cooldown(
        &self,
        guild: Option<GuildId>,
        game_type: GameType,
        default_ms: u64,
    ) -> u64 {
        let Some(guild) = guild else {
            return default_ms;
        };
        self.overrides
            .for_game(guild, game_type)
            .or_else(|| self.overrides.for_all(guild))
            .unwrap_or(default_ms)
    }

    /// Drop burst entries outside the window and stamps older than a day.
    pub fn prune(&mut self, now: u64) {
        let window = self.burst_window_ms;
        self.bursts.retain(|_, starts| {
            starts.retain(|at| in_window(*at, now, window));
            !starts.is_empty()
        });
        let before = self.stamps.len();
        self.stamps
            .retain(|_, at| in_window(*at, now, COOLDOWN_STAMP_TTL_MS));
        debug!(
            pruned = before - self.stamps.len(),
            remaining = self.stamps.len(),
            "cooldown stamps pruned"
        );
    }
}

/// Whether a stamp taken at `at` is younger than `window_ms` at `now`.
fn in_window(at: u64, now: u64, window_ms: u64) -> bool {
    now.saturating_sub(at) < window_ms
}
