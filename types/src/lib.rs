//! Shared arcade types.
//!
//! Identifiers, game types, the interactive-control action id format, and the
//! constants shared by the execution engine and the host service.

pub mod arcade;

pub use arcade::*;
