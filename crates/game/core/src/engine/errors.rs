//! Error types surfaced by the engine facade.

use crate::ability::AbilityError;
use crate::error::{ErrorSeverity, GameError};
use crate::knock::KnockError;
use crate::phase::PhaseError;
use crate::preset::PresetError;
use crate::queue::QueueError;

/// Errors surfaced while applying a session command.
///
/// A failed command leaves the session state as it was, with partial
/// consumption rolled back, except for one case. When an opened knock cannot
/// pay its visit, `respond_knock` discards the ticket and records
/// `KnockResolved { outcome: Aborted }` before returning
/// `KnockError::NoVisitsRemaining`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineError {
    #[error("phase: {0}")]
    Phase(#[from] PhaseError),

    #[error("ability: {0}")]
    Ability(#[from] AbilityError),

    #[error("queue: {0}")]
    Queue(#[from] QueueError),

    #[error("knock: {0}")]
    Knock(#[from] KnockError),

    #[error("preset: {0}")]
    Preset(#[from] PresetError),
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Phase(err) => err.severity(),
            Self::Ability(err) => err.severity(),
            Self::Queue(err) => err.severity(),
            Self::Knock(err) => err.severity(),
            Self::Preset(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Phase(err) => err.error_code(),
            Self::Ability(err) => err.error_code(),
            Self::Queue(err) => err.error_code(),
            Self::Knock(err) => err.error_code(),
            Self::Preset(err) => err.error_code(),
        }
    }
}
