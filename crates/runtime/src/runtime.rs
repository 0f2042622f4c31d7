//! High-level runtime orchestrator.
//!
//! The runtime owns a registry of independent sessions. Opening a session
//! spawns its workers and wires up command/event channels; the returned
//! [`SessionHandle`] is the only way to reach the session's state.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use game_content::ScenarioSeed;
use game_core::{Engine, SessionConfig, SessionState};

use crate::api::{Notifier, Result, RuntimeError, SessionHandle, TracingNotifier};
use crate::events::EventBus;
use crate::repository::{FileStateRepository, StateRepository, validate_session_id};
use crate::types::SessionId;
use crate::workers::{NotificationWorker, PersistenceWorker, SessionWorker, Snapshot};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub session: SessionConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Snapshot directory; `None` keeps sessions in memory only.
    pub save_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            save_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `MANOR_COMMAND_BUFFER` - Command queue size per session (default: 32)
    /// - `MANOR_EVENT_BUFFER` - Broadcast capacity per topic (default: 100)
    /// - `MANOR_SAVE_DIR` - Snapshot directory (default: none, no persistence);
    ///   set but empty selects [`RuntimeConfig::default_save_dir`]
    /// - `MANOR_TICKET_TTL` - Phase transitions before a knock ticket expires
    ///   (default: never)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = read_env::<usize>("MANOR_COMMAND_BUFFER") {
            config.command_buffer_size = size.max(1);
        }

        if let Some(size) = read_env::<usize>("MANOR_EVENT_BUFFER") {
            config.event_buffer_size = size.max(1);
        }

        config.save_dir = save_dir_from(env::var("MANOR_SAVE_DIR").ok());

        if let Some(ttl) = read_env::<u32>("MANOR_TICKET_TTL") {
            config.session.ticket_ttl_phases = Some(ttl);
        }

        config
    }

    /// Platform data directory for snapshots, e.g. `~/.local/share/manor/sessions`.
    pub fn default_save_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "manor")
            .map(|dirs| dirs.data_dir().join("sessions"))
    }
}

fn save_dir_from(value: Option<String>) -> Option<PathBuf> {
    match value {
        Some(path) if path.trim().is_empty() => RuntimeConfig::default_save_dir(),
        Some(path) => Some(PathBuf::from(path)),
        None => None,
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

struct SessionSlot {
    handle: SessionHandle,
    workers: Vec<JoinHandle<()>>,
}

/// Main runtime that orchestrates game sessions
///
/// Sessions share nothing but the notifier and the repository; each one is
/// driven by its own worker task.
pub struct Runtime {
    config: RuntimeConfig,
    repository: Option<Arc<dyn StateRepository>>,
    notifier: Arc<dyn Notifier>,
    sessions: HashMap<SessionId, SessionSlot>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Open a session, restoring its snapshot when the repository has one.
    ///
    /// Opening an already-open session returns its existing handle.
    pub async fn open_session(&mut self, session: impl Into<SessionId>) -> Result<SessionHandle> {
        self.open(session.into(), None).await
    }

    /// Like [`Runtime::open_session`], but a session with no stored snapshot
    /// is seeded from `scenario` first.
    pub async fn open_seeded(
        &mut self,
        session: impl Into<SessionId>,
        scenario: &ScenarioSeed,
    ) -> Result<SessionHandle> {
        self.open(session.into(), Some(scenario)).await
    }

    async fn open(
        &mut self,
        session: SessionId,
        scenario: Option<&ScenarioSeed>,
    ) -> Result<SessionHandle> {
        if let Some(slot) = self.sessions.get(&session) {
            return Ok(slot.handle.clone());
        }
        validate_session_id(&session)?;

        let stored = match &self.repository {
            Some(repository) => repository.load(&session)?,
            None => None,
        };
        let restored = stored.is_some();

        // revision 1 marks a freshly seeded state as not yet saved
        let (state, revision) = match (stored, scenario) {
            (Some(state), _) => (state, 0),
            (None, Some(scenario)) => {
                let mut state = SessionState::new();
                {
                    let mut engine = Engine::new(&mut state, &self.config.session);
                    scenario
                        .apply(&mut engine)
                        .map_err(|source| RuntimeError::Seed {
                            session: session.clone(),
                            source,
                        })?;
                    debug!(session = %session, events = engine.events().len(), "session seeded");
                }
                (state, 1)
            }
            (None, None) => (SessionState::new(), 0),
        };

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let mut workers = Vec::with_capacity(3);

        let snapshot_tx = self.repository.as_ref().map(|repository| {
            let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
                revision,
                state: state.clone(),
            });
            let persistence =
                PersistenceWorker::new(session.clone(), Arc::clone(repository), snapshot_rx, 0);
            workers.push(tokio::spawn(persistence.run()));
            snapshot_tx
        });

        let notification = NotificationWorker::new(Arc::clone(&self.notifier), notify_rx);
        workers.push(tokio::spawn(notification.run()));

        let worker = SessionWorker::new(
            session.clone(),
            state,
            self.config.session.clone(),
            command_rx,
            event_bus.clone(),
            notify_tx,
            snapshot_tx,
            revision,
        );
        workers.push(tokio::spawn(worker.run()));

        let handle = SessionHandle::new(session.clone(), command_tx, event_bus);
        info!(session = %session, restored, "session opened");

        self.sessions.insert(
            session,
            SessionSlot {
                handle: handle.clone(),
                workers,
            },
        );
        Ok(handle)
    }

    /// Handle of an open session
    pub fn session(&self, session: &str) -> Option<SessionHandle> {
        self.sessions.get(session).map(|slot| slot.handle.clone())
    }

    /// Ids of the open sessions, sorted
    pub fn sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids with a stored snapshot, open or not
    pub fn stored_sessions(&self) -> Result<Vec<SessionId>> {
        match &self.repository {
            Some(repository) => Ok(repository.list_sessions()?),
            None => Ok(Vec::new()),
        }
    }

    /// Stop a session's workers once its queued commands are processed.
    ///
    /// The final snapshot is saved before this returns.
    pub async fn close_session(&mut self, session: &str) -> Result<()> {
        let slot = self
            .sessions
            .remove(session)
            .ok_or_else(|| RuntimeError::SessionNotFound(session.to_string()))?;

        slot.handle.shutdown().await?;
        for worker in slot.workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }

        info!(session = %session, "session closed");
        Ok(())
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(mut self) -> Result<()> {
        for session in self.sessions() {
            self.close_session(&session).await?;
        }
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn StateRepository>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            notifier: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Snapshot storage; takes precedence over `config.save_dir`
    pub fn repository(mut self, repository: impl StateRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Share one repository between several runtimes
    pub fn shared_repository(mut self, repository: Arc<dyn StateRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Outbound event delivery (default: [`TracingNotifier`])
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<Runtime> {
        let repository = match (self.repository, &self.config.save_dir) {
            (Some(repository), _) => Some(repository),
            (None, Some(dir)) => {
                Some(Arc::new(FileStateRepository::new(dir)?) as Arc<dyn StateRepository>)
            }
            (None, None) => None,
        };

        Ok(Runtime {
            config: self.config,
            repository,
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(TracingNotifier)),
            sessions: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_sessions_in_memory() {
        let config = RuntimeConfig::default();
        assert_eq!(config.command_buffer_size, 32);
        assert_eq!(config.event_buffer_size, 100);
        assert!(config.save_dir.is_none());
        assert_eq!(config.session.ticket_ttl_phases, None);
    }

    #[test]
    fn empty_save_dir_falls_back_to_platform_dir() {
        assert_eq!(save_dir_from(None), None);
        assert_eq!(
            save_dir_from(Some("/tmp/manor".into())),
            Some(PathBuf::from("/tmp/manor"))
        );
        let fallback = save_dir_from(Some("  ".into()));
        assert_eq!(fallback, RuntimeConfig::default_save_dir());
        if let Some(dir) = fallback {
            assert!(dir.ends_with("sessions"));
        }
    }

    #[tokio::test]
    async fn rejects_unsafe_session_ids() {
        let mut runtime = Runtime::builder().build().unwrap();
        let err = runtime.open_session("../other").await.err().unwrap();
        assert!(matches!(err, RuntimeError::Repository(_)));
        assert!(runtime.sessions().is_empty());
    }
}
