/// Maximum length of an interactive-control custom id.
pub const MAX_ACTION_ID_LENGTH: usize = 100;

/// Reserved override key applying to every game in a guild.
pub const GLOBAL_COOLDOWN_KEY: &str = "all";

/// Starting balance for newly seen players.
pub const STARTING_BALANCE: u64 = 1_000;

/// Maximum game starts per player inside one burst window.
pub const DEFAULT_BURST_LIMIT: usize = 8;

/// Sliding window used by the burst-rate guard.
pub const BURST_WINDOW_MS: u64 = 60 * 1_000;

/// How long a finished session stays queryable before it is purged.
pub const SESSION_RETENTION_MS: u64 = 5 * 60 * 1_000;

/// Idle time after which a live session is treated as abandoned.
pub const SESSION_IDLE_MS: u64 = 10 * 60 * 1_000;

/// Interval between registry sweeps.
pub const SWEEP_INTERVAL_MS: u64 = 5 * 60 * 1_000;

/// Cooldown stamps older than this are dropped by the sweep (longest built-in cooldown).
pub const COOLDOWN_STAMP_TTL_MS: u64 = 24 * 60 * 60 * 1_000;

/// XP granted for every completed game.
pub const XP_PER_GAME: u64 = 10;

/// Extra XP granted when the player wins.
pub const XP_WIN_BONUS: u64 = 15;

/// XP needed per level step (`level = floor(sqrt(xp / XP_PER_LEVEL_STEP))`).
pub const XP_PER_LEVEL_STEP: u64 = 100;

/// Voice presence accrual interval.
pub const VOICE_ACCRUAL_INTERVAL_MS: u64 = 60 * 1_000;

/// Coins credited per voice accrual tick.
pub const VOICE_ACCRUAL_COINS: u64 = 5;
