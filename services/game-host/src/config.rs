//! Host configuration.
//!
//! Loaded from an optional YAML file, then `ARCADE_HOST` / `ARCADE_PORT` override the listen
//! address. Every field has a default so an empty file is valid.

use anyhow::{Context, Result};
use arcade_execution::GameLimits;
use arcade_types::{
    CooldownOverrides, GameType, BURST_WINDOW_MS, DEFAULT_BURST_LIMIT, SESSION_IDLE_MS,
    SESSION_RETENTION_MS, STARTING_BALANCE, SWEEP_INTERVAL_MS, VOICE_ACCRUAL_INTERVAL_MS,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub host: String,
    pub port: u16,
    /// Fixed seed for game randomness; random per process when absent.
    pub rng_seed: Option<u64>,
    pub starting_balance: u64,
    pub burst_limit: usize,
    pub burst_window_ms: u64,
    pub sweep_interval_ms: u64,
    pub session_retention_ms: u64,
    pub session_idle_ms: u64,
    pub accrual_interval_ms: u64,
    /// Guild id -> game key (or `all`) -> cooldown in ms.
    pub cooldown_overrides: CooldownOverrides,
    /// Game key -> bet bound / cooldown / active adjustments.
    pub games: HashMap<String, GameLimits>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9130,
            rng_seed: None,
            starting_balance: STARTING_BALANCE,
            burst_limit: DEFAULT_BURST_LIMIT,
            burst_window_ms: BURST_WINDOW_MS,
            sweep_interval_ms: SWEEP_INTERVAL_MS,
            session_retention_ms: SESSION_RETENTION_MS,
            session_idle_ms: SESSION_IDLE_MS,
            accrual_interval_ms: VOICE_ACCRUAL_INTERVAL_MS,
            cooldown_overrides: CooldownOverrides::default(),
            games: HashMap::new(),
        }
    }
}

impl HostConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read config file {}", path.display()))?;
                Self::parse(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("Could not parse config file")
    }

    /// Apply `ARCADE_HOST` / `ARCADE_PORT`. Unparseable ports are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("ARCADE_HOST") {
            self.host = host;
        }
        if let Some(port) = var("ARCADE_PORT").and_then(|raw| raw.parse().ok()) {
            self.port = port;
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("invalid listen addr")
    }

    /// Per-game limits keyed by parsed game type.
    pub fn game_limits(&self) -> Result<Vec<(GameType, GameLimits)>> {
        self.games
            .iter()
            .map(|(key, limits)| {
                let game_type = key
                    .parse::<GameType>()
                    .with_context(|| format!("unknown game in config: {key}"))?;
                Ok((game_type, *limits))
            })
            .collect()
    }
}
