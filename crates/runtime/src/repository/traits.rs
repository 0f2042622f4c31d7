//! Repository contract for saving and loading session snapshots.

use game_core::SessionState;

use super::{RepositoryError, Result};

/// Storage for full session snapshots, one per session id.
pub trait StateRepository: Send + Sync {
    /// Save (or replace) the snapshot of a session
    fn save(&self, session: &str, state: &SessionState) -> Result<()>;

    /// Load the snapshot of a session, `None` if it was never saved
    fn load(&self, session: &str) -> Result<Option<SessionState>>;

    /// Check if a snapshot exists
    fn exists(&self, session: &str) -> bool;

    /// Delete a snapshot; deleting a missing one is not an error
    fn delete(&self, session: &str) -> Result<()>;

    /// List stored session ids in ascending order
    fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}

/// Session ids double as file stems, so they are restricted to a safe set.
pub fn validate_session_id(session: &str) -> Result<()> {
    let valid = !session.is_empty()
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidSessionId(session.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_limited_to_file_safe_characters() {
        assert!(validate_session_id("night-club_7").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("../escape").is_err());
        assert!(validate_session_id("with space").is_err());
    }
}
