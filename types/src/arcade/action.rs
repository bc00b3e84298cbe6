//! Interactive-control routing ids.
//!
//! Every outbound button encodes the game type, the session id and the action token:
//! `{game}:{session_hex}:{action}` with an optional `:{generation}` suffix. The generation pins
//! the button to the round it was rendered for, so a click on a stale message is rejected
//! instead of being applied to a later round. The engine stamps every in-game control; only
//! the replay and join buttons travel unstamped.

use super::{GameType, SessionId, MAX_ACTION_ID_LENGTH};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ActionIdError {
    #[error("action id too long (len={len}, max={max})")]
    TooLong { len: usize, max: usize },
    #[error("action id must have 3 or 4 segments (got {0})")]
    SegmentCount(usize),
    #[error("unknown game type: {0}")]
    UnknownGame(String),
    #[error("invalid session id: {0}")]
    InvalidSession(String),
    #[error("invalid action token: {0}")]
    InvalidAction(String),
    #[error("invalid generation: {0}")]
    InvalidGeneration(String),
}

/// Parsed `{gameType, sessionId, action}` triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionId {
    pub game_type: GameType,
    pub session_id: SessionId,
    pub action: String,
    pub generation: Option<u64>,
}

impl ActionId {
    pub fn new(game_type: GameType, session_id: SessionId, action: impl Into<String>) -> Self {
        Self {
            game_type,
            session_id,
            action: action.into(),
            generation: None,
        }
    }

    /// Pin this action to a specific round generation.
    pub fn at_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.game_type, self.session_id, self.action)?;
        if let Some(generation) = self.generation {
            write!(f, ":{generation}")?;
        }
        Ok(())
    }
}

impl FromStr for ActionId {
    type Err = ActionIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.len() > MAX_ACTION_ID_LENGTH {
            return Err(ActionIdError::TooLong {
                len: raw.len(),
                max: MAX_ACTION_ID_LENGTH,
            });
        }
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(ActionIdError::SegmentCount(parts.len()));
        }

        let game_type = parts[0]
            .parse::<GameType>()
            .map_err(|_| ActionIdError::UnknownGame(parts[0].to_string()))?;
        let session_id = SessionId::from_hex(parts[1])
            .ok_or_else(|| ActionIdError::InvalidSession(parts[1].to_string()))?;
        if !is_valid_token(parts[2]) {
            return Err(ActionIdError::InvalidAction(parts[2].to_string()));
        }
        let generation = match parts.get(3) {
            Some(raw_generation) => Some(
                raw_generation
                    .parse::<u64>()
                    .map_err(|_| ActionIdError::InvalidGeneration(raw_generation.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            game_type,
            session_id,
            action: parts[2].to_string(),
            generation,
        })
    }
}
