use super::{GameType, GuildId, GLOBAL_COOLDOWN_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-guild cooldown overrides.
///
/// Each guild maps a game key (`GameType::as_str`) or the reserved `"all"` key to a cooldown in
/// milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooldownOverrides {
    guilds: HashMap<GuildId, HashMap<String, u64>>,
}

impl CooldownOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, guild: GuildId, key: impl Into<String>, cooldown_ms: u64) {
        self.guilds
            .entry(guild)
            .or_default()
            .insert(key.into(), cooldown_ms);
    }

    pub fn clear(&mut self, guild: GuildId, key: &str) -> Option<u64> {
        let entries = self.guilds.get_mut(&guild)?;
        let removed = entries.remove(key);
        if entries.is_empty() {
            self.guilds.remove(&guild);
        }
        removed
    }

    /// Override configured for exactly this game in this guild.
    pub fn for_game(&self, guild: GuildId, game_type: GameType) -> Option<u64> {
        self.guilds.get(&guild)?.get(game_type.as_str()).copied()
    }

    /// Guild-wide `"all"` override.
    pub fn for_all(&self, guild: GuildId) -> Option<u64> {
        self.guilds.get(&guild)?.get(GLOBAL_COOLDOWN_KEY).copied()
    }
}
