//! JSON websocket protocol spoken with the chat adapter.

use arcade_execution::{ActionEvent, NoticeKind, Outbound, RenderSummary, StartRequest};
use arcade_types::{GameType, GuildId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "start")]
    Start {
        #[serde(rename = "playerId")]
        player_id: u64,
        game: String,
        #[serde(default)]
        bet: u64,
        #[serde(rename = "guildId", default)]
        guild_id: Option<u64>,
    },
    #[serde(rename = "action")]
    Action {
        #[serde(rename = "playerId")]
        player_id: u64,
        #[serde(rename = "customId")]
        custom_id: String,
        #[serde(default)]
        value: Option<String>,
    },
    #[serde(rename = "presence")]
    Presence {
        #[serde(rename = "playerId")]
        player_id: u64,
        joined: bool,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "render")]
    Render {
        #[serde(rename = "sessionId")]
        session_id: String,
        players: Vec<PlayerId>,
        view: serde_json::Value,
        summary: RenderSummary,
    },
    #[serde(rename = "notice")]
    Notice {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        kind: NoticeKind,
        message: String,
    },
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl From<Outbound> for OutboundMessage {
    fn from(outbound: Outbound) -> Self {
        match outbound {
            Outbound::Render {
                session_id,
                players,
                image,
                summary,
            } => OutboundMessage::Render {
                session_id: session_id.to_string(),
                players,
                view: serde_json::from_slice(&image).unwrap_or(serde_json::Value::Null),
                summary,
            },
            Outbound::Notice {
                player,
                kind,
                message,
            } => OutboundMessage::Notice {
                player_id: player,
                kind,
                message,
            },
        }
    }
}

/// Inbound messages after validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start(StartRequest),
    Action(ActionEvent),
    Presence { player: PlayerId, joined: bool },
}

impl TryFrom<InboundMessage> for Command {
    type Error = OutboundMessage;

    fn try_from(message: InboundMessage) -> Result<Self, Self::Error> {
        match message {
            InboundMessage::Start {
                player_id,
                game,
                bet,
                guild_id,
            } => {
                let game_type = game.parse::<GameType>().map_err(|err| OutboundMessage::Error {
                    code: "UNKNOWN_GAME".to_string(),
                    message: err.to_string(),
                })?;
                Ok(Command::Start(StartRequest {
                    player: PlayerId(player_id),
                    game_type,
                    bet,
                    guild: guild_id.map(GuildId),
                }))
            }
            InboundMessage::Action {
                player_id,
                custom_id,
                value,
            } => Ok(Command::Action(ActionEvent {
                player: PlayerId(player_id),
                custom_id,
                value,
            })),
            InboundMessage::Presence { player_id, joined } => Ok(Command::Presence {
                player: PlayerId(player_id),
                joined,
            }),
        }
    }
}
