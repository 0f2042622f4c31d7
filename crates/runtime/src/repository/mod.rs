//! Repository layer for session snapshots.
//!
//! Each session is stored as one full [`game_core::SessionState`] snapshot
//! keyed by its session id. Restoring a snapshot needs no replay.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileStateRepository;
pub use memory::InMemoryStateRepo;
pub use traits::{StateRepository, validate_session_id};
