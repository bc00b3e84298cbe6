//! Rendering gateway.
//!
//! A renderer is a pure `state -> bytes` function. The host forwards the bytes untouched; the
//! production image renderer lives outside this crate.

use crate::games::GameState;
use arcade_types::GameType;
use serde::Serialize;

pub trait Renderer {
    fn render(&self, game_type: GameType, state: &GameState) -> Vec<u8>;
}

#[derive(Serialize)]
struct View<'a> {
    game_type: GameType,
    #[serde(flatten)]
    state: &'a GameState,
}

/// Renders the public view of a session as JSON. Hidden fields never leave the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, game_type: GameType, state: &GameState) -> Vec<u8> {
        serde_json::to_vec(&View { game_type, state }).unwrap_or_default()
    }
}
