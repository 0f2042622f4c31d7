//! Deterministic resolution rules for a turn-based social game.
//!
//! `game-core` defines the phase clock, visit inventory, block registry,
//! ability registry, resolution queue, presets and knock workflow, and
//! exposes them through pure APIs with no I/O. All state mutation flows through
//! [`engine::Engine`]; the runtime and loaders depend on the types
//! re-exported here.
pub mod ability;
pub mod blocks;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod knock;
pub mod phase;
pub mod preset;
pub mod queue;
pub mod state;

pub use ability::{AbilityAssignment, AbilityError, AbilityKey, AbilityRegistry, Category, Team};
pub use blocks::{BlockKey, BlockRegistry, BlockSpan};
pub use config::SessionConfig;
pub use engine::{Engine, EngineError, EngineEvent};
pub use error::{ErrorSeverity, GameError};
pub use inventory::{Holder, Income, TokenInventory, VisitCounts, VisitKind};
pub use knock::{
    KnockError, KnockOutcome, KnockRequest, KnockResolution, KnockStart, KnockTicket,
    KnockVerdict, KnockWorkflow, Modifiers, Movement,
};
pub use phase::{
    Boundary, Epoch, ExpiryError, PhaseClock, PhaseError, PhaseReading, PhaseToken,
    PhaseTransition, Until,
};
pub use preset::{PRESET_PAGE_SIZE, Preset, PresetAbility, PresetBook, PresetError, PresetPage};
pub use queue::{
    ActionStatus, AppliedAction, MAX_DESCRIPTION_CHARS, NewAction, PendingAction, QueueError,
    ResolutionQueue, ResolutionReport, SkipReason, SkippedAction,
};
pub use state::{ActionId, ActorId, CorrelationToken, LocationId, SessionState, Whereabouts};
