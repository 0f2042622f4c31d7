//! File-based StateRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use game_core::SessionState;
use sha2::{Digest, Sha256};

use crate::repository::{RepositoryError, Result, StateRepository, validate_session_id};

const MAGIC: &[u8; 4] = b"MNRS";
const FORMAT_VERSION: u8 = 1;
const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 1 + DIGEST_LEN;
const EXTENSION: &str = "state";

/// File-based implementation of StateRepository.
///
/// Stores one snapshot per session as `{session}.state`.
///
/// # File Format
///
/// ```text
/// [4 bytes "MNRS"][u8 version][32 bytes SHA-256 of payload][bincode SessionState]
/// ```
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-save leaves the previous snapshot intact.
pub struct FileStateRepository {
    base_dir: PathBuf,
}

impl FileStateRepository {
    /// Create a new file-based state repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn state_path(&self, session: &str) -> Result<PathBuf> {
        validate_session_id(session)?;
        Ok(self.base_dir.join(format!("{session}.{EXTENSION}")))
    }

    fn encode(state: &SessionState) -> Result<Vec<u8>> {
        let payload =
            bincode::serialize(state).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let digest = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    fn decode(session: &str, bytes: &[u8]) -> Result<SessionState> {
        if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(RepositoryError::CorruptedData(format!(
                "{session}: missing snapshot header"
            )));
        }
        let version = bytes[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(RepositoryError::CorruptedData(format!(
                "{session}: unsupported snapshot version {version}"
            )));
        }

        let expected = &bytes[MAGIC.len() + 1..HEADER_LEN];
        let payload = &bytes[HEADER_LEN..];
        let actual = Sha256::digest(payload);
        if actual.as_slice() != expected {
            return Err(RepositoryError::ChecksumMismatch {
                session: session.to_string(),
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }

        bincode::deserialize(payload).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

impl StateRepository for FileStateRepository {
    fn save(&self, session: &str, state: &SessionState) -> Result<()> {
        let path = self.state_path(session)?;
        let temp_path = path.with_extension("state.tmp");

        let bytes = Self::encode(state)?;

        // Write to temp file
        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;

        // Atomic rename
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved session[{}] to {}", session, path.display());

        Ok(())
    }

    fn load(&self, session: &str) -> Result<Option<SessionState>> {
        let path = self.state_path(session)?;

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let state = Self::decode(session, &bytes)?;

        tracing::debug!("Loaded session[{}] from {}", session, path.display());

        Ok(Some(state))
    }

    fn exists(&self, session: &str) -> bool {
        self.state_path(session)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    fn delete(&self, session: &str) -> Result<()> {
        let path = self.state_path(session)?;

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted session[{}]", session);
        }

        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        let mut sessions = Vec::new();

        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_session_id(stem).is_ok()
            {
                sessions.push(stem.to_string());
            }
        }

        sessions.sort_unstable();
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ActorId, Income, LocationId, PhaseToken};
    use tempfile::TempDir;

    fn sample_state() -> SessionState {
        let mut state = SessionState::new();
        state.clock.advance(PhaseToken::Night);
        state.inventory.set_income(ActorId(4), Income::new(1, 2));
        state.whereabouts.place(ActorId(4), LocationId(9));
        state
    }

    #[test]
    fn snapshot_survives_a_new_repository_instance() {
        let dir = TempDir::new().unwrap();
        let state = sample_state();
        FileStateRepository::new(dir.path())
            .unwrap()
            .save("game-1", &state)
            .unwrap();

        let reopened = FileStateRepository::new(dir.path()).unwrap();
        assert_eq!(reopened.load("game-1").unwrap(), Some(state));
        assert_eq!(reopened.list_sessions().unwrap(), vec!["game-1"]);
        assert!(!dir.path().join("game-1.state.tmp").exists());
    }

    #[test]
    fn flipped_payload_byte_fails_the_checksum() {
        let dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(dir.path()).unwrap();
        repo.save("g", &sample_state()).unwrap();

        let path = dir.path().join("g.state");
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            repo.load("g"),
            Err(RepositoryError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn foreign_files_are_rejected_or_ignored() {
        let dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(dir.path()).unwrap();
        fs::write(dir.path().join("junk.state"), b"nope").unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        assert!(matches!(
            repo.load("junk"),
            Err(RepositoryError::CorruptedData(_))
        ));
        assert_eq!(repo.list_sessions().unwrap(), vec!["junk"]);
        assert_eq!(repo.load("missing").unwrap(), None);
        assert!(repo.load("../x").is_err());
    }
}
