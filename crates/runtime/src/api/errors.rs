//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories and the engine so
//! clients can bubble them up with consistent context.

use game_core::{EngineError, ErrorSeverity, GameError};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;
use crate::types::SessionId;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to seed session {session}")]
    Seed {
        session: SessionId,
        #[source]
        source: game_content::ScenarioError,
    },

    #[error("session {0} is not open")]
    SessionNotFound(SessionId),

    #[error("{operation} produced an unexpected reply")]
    UnexpectedReply { operation: &'static str },

    #[error("notifier failed: {0}")]
    Notifier(String),

    #[error("failed to encode session state")]
    StateEncoding(#[source] bincode::Error),
}

impl RuntimeError {
    /// Engine errors keep their own severity; everything else here is
    /// infrastructure.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Engine(err) => err.severity(),
            Self::SessionNotFound(_) | Self::Seed { .. } => ErrorSeverity::Validation,
            Self::Notifier(_) => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Internal,
        }
    }
}
