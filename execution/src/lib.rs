//! Arcade game session engine.
//!
//! This crate owns everything between an inbound chat event and the outbound message: the game
//! state machines, the live session registry, the cooldown gate, bet escrow and settlement, and
//! the timers that race user actions.
//!
//! ## Invariants
//! - A player sits in at most one non-finished session.
//! - Escrowed stakes always end up paid out, refunded or recorded as lost, exactly once.
//! - A timer only acts on the session generation it was scheduled for.
//!
//! ## Minimal pipeline (example)
//! ```rust,ignore
//! use std::sync::Arc;
//! use arcade_execution::{
//!     JsonRenderer, MemoryLedger, Orchestrator, SeededRng, StartRequest, SystemClock,
//! };
//! use arcade_types::{GameType, PlayerId};
//!
//! let mut orchestrator = Orchestrator::new(
//!     MemoryLedger::default(),
//!     JsonRenderer,
//!     timers, // any `TimerSink`, e.g. `Scheduler<EngineEvent>`
//!     Arc::new(SystemClock),
//!     Box::new(SeededRng::new(42)),
//! );
//! let outbound = orchestrator.handle_start(StartRequest {
//!     player: PlayerId(1),
//!     game_type: GameType::CoinFlip,
//!     bet: 100,
//!     guild: None,
//! });
//! ```

pub mod cooldown;
pub mod games;
pub mod ledger;
pub mod orchestrator;
pub mod render;
pub mod scheduler;
pub mod session;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use cooldown::{CooldownCheck, CooldownGuard};
pub use games::registry::{GameCategory, GameInfo, GameLimits, GameRegistry};
pub use games::{
    action_tokens, apply_game_action, game_timeout, start_game, ArcadeGame, GameAction, GameError,
    GameResult, GameRng, GameState,
};
pub use ledger::{GameOutcome, GameStats, Ledger, LedgerError, MemoryLedger, ProgressKind};
pub use orchestrator::{
    ActionEvent, NoticeKind, Orchestrator, Outbound, Rejection, RenderSummary, RngProvider,
    SeededRng, StartRequest,
};
pub use render::{JsonRenderer, Renderer};
pub use scheduler::{
    AccrualTick, Clock, ManualClock, PresenceTracker, Scheduler, SystemClock, Timer, TimerFired,
    TimerSink,
};
pub use session::{GameSession, RegistryError, SessionRegistry, SweepReport};
