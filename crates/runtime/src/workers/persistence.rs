//! Persistence worker that stores the latest session snapshot.
//!
//! Snapshots arrive through a watch channel, so a burst of commands while a
//! save is in flight collapses into one save of the newest state. Saves run
//! on the blocking pool.

use std::sync::Arc;

use game_core::SessionState;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::repository::StateRepository;
use crate::types::SessionId;

/// Session state tagged with a monotonically increasing revision.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub revision: u64,
    pub state: SessionState,
}

pub struct PersistenceWorker {
    session: SessionId,
    repository: Arc<dyn StateRepository>,
    snapshot_rx: watch::Receiver<Snapshot>,
    saved_revision: u64,
}

impl PersistenceWorker {
    /// `saved_revision` is the revision already in the repository; the
    /// initial snapshot is written only if it is newer.
    pub fn new(
        session: SessionId,
        repository: Arc<dyn StateRepository>,
        snapshot_rx: watch::Receiver<Snapshot>,
        saved_revision: u64,
    ) -> Self {
        Self {
            session,
            repository,
            snapshot_rx,
            saved_revision,
        }
    }

    pub async fn run(mut self) {
        self.save_latest().await;
        while self.snapshot_rx.changed().await.is_ok() {
            self.save_latest().await;
        }
        // the sender is gone; make sure its last value reached storage
        self.save_latest().await;
        debug!(session = %self.session, revision = self.saved_revision, "PersistenceWorker stopped");
    }

    async fn save_latest(&mut self) {
        let snapshot = self.snapshot_rx.borrow_and_update().clone();
        if snapshot.revision <= self.saved_revision {
            return;
        }

        let repository = Arc::clone(&self.repository);
        let session = self.session.clone();
        let Snapshot { revision, state } = snapshot;
        let saved = tokio::task::spawn_blocking(move || repository.save(&session, &state)).await;

        match saved {
            Ok(Ok(())) => {
                self.saved_revision = revision;
                debug!(session = %self.session, revision, "snapshot saved");
            }
            Ok(Err(err)) => {
                error!(session = %self.session, revision, "failed to save snapshot: {err}");
            }
            Err(err) => {
                error!(session = %self.session, revision, "snapshot save task failed: {err}");
            }
        }
    }
}
