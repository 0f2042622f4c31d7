//! In-memory StateRepository implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use game_core::SessionState;

use crate::repository::{RepositoryError, Result, StateRepository};

/// In-memory implementation of StateRepository.
///
/// Snapshots are cloned in and out; nothing survives the process.
pub struct InMemoryStateRepo {
    states: RwLock<BTreeMap<String, SessionState>>,
}

impl InMemoryStateRepo {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            states: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create with one session already stored.
    pub fn with_session(session: impl Into<String>, state: SessionState) -> Self {
        let mut states = BTreeMap::new();
        states.insert(session.into(), state);
        Self {
            states: RwLock::new(states),
        }
    }
}

impl Default for InMemoryStateRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRepository for InMemoryStateRepo {
    fn save(&self, session: &str, state: &SessionState) -> Result<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        states.insert(session.to_string(), state.clone());
        Ok(())
    }

    fn load(&self, session: &str) -> Result<Option<SessionState>> {
        let states = self
            .states
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(states.get(session).cloned())
    }

    fn exists(&self, session: &str) -> bool {
        self.states
            .read()
            .map(|states| states.contains_key(session))
            .unwrap_or(false)
    }

    fn delete(&self, session: &str) -> Result<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        states.remove(session);
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        let states = self
            .states
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(states.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ActorId, LocationId};

    #[test]
    fn save_replaces_and_delete_forgets() {
        let repo = InMemoryStateRepo::new();
        let mut state = SessionState::new();
        repo.save("a", &state).unwrap();

        state.whereabouts.place(ActorId(1), LocationId(2));
        repo.save("a", &state).unwrap();
        assert_eq!(repo.load("a").unwrap(), Some(state));

        repo.delete("a").unwrap();
        assert!(!repo.exists("a"));
        assert_eq!(repo.load("a").unwrap(), None);
    }

    #[test]
    fn lists_sessions_in_order() {
        let repo = InMemoryStateRepo::with_session("b", SessionState::new());
        repo.save("a", &SessionState::new()).unwrap();
        assert_eq!(repo.list_sessions().unwrap(), vec!["a", "b"]);
    }
}
