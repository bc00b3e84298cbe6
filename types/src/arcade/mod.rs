//! Arcade domain types.
//!
//! Defines identifiers, game types, action routing ids and constants used by the execution
//! layer and the host service.

mod action;
mod constants;
mod game;
mod ids;
mod overrides;

pub use action::*;
pub use constants::*;
pub use game::*;
pub use ids::*;
pub use overrides::*;

#[cfg(test)]
mod tests;
