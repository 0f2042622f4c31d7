//! Session worker that owns the authoritative [`game_core::SessionState`].
//!
//! Receives commands from [`crate::SessionHandle`], applies them through
//! [`game_core::Engine`] one at a time, and fans the raised events out to the
//! EventBus and the notification worker.

use tokio::sync::{mpsc, oneshot, watch};

use game_core::{Engine, GameError, SessionConfig, SessionState};
use tracing::{debug, info, warn};

use super::persistence::Snapshot;
use crate::api::{Operation, Outcome, Result};
use crate::events::{Event, EventBus};
use crate::types::SessionId;

/// Commands that can be sent to the session worker
pub enum Command {
    /// Apply one engine operation.
    Execute {
        op: Operation,
        reply: oneshot::Sender<Result<Outcome>>,
    },
    /// Query the current session state (read-only).
    QueryState { reply: oneshot::Sender<SessionState> },
    /// Stop after the reply is sent; later commands are dropped.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Background task that processes session commands.
pub struct SessionWorker {
    session: SessionId,
    state: SessionState,
    config: SessionConfig,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    notify_tx: mpsc::UnboundedSender<Event>,
    snapshot_tx: Option<watch::Sender<Snapshot>>,
    sequence: u64,
    revision: u64,
}

impl SessionWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: SessionId,
        state: SessionState,
        config: SessionConfig,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        notify_tx: mpsc::UnboundedSender<Event>,
        snapshot_tx: Option<watch::Sender<Snapshot>>,
        revision: u64,
    ) -> Self {
        info!(
            session = %session,
            phase = %state.clock.reading(),
            pending = state.queue.len(),
            "SessionWorker initialized"
        );

        Self {
            session,
            state,
            config,
            command_rx,
            event_bus,
            notify_tx,
            snapshot_tx,
            sequence: 0,
            revision,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                else => break,
            }
        }
        info!(session = %self.session, "SessionWorker stopped");
    }

    /// Returns false once the worker should stop.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Execute { op, reply } => {
                let result = self.execute(op);
                if reply.send(result).is_err() {
                    debug!("Execute reply channel closed (caller dropped)");
                }
                true
            }
            Command::QueryState { reply } => {
                if reply.send(self.state.clone()).is_err() {
                    debug!("QueryState reply channel closed (caller dropped)");
                }
                true
            }
            Command::Shutdown { reply } => {
                if reply.send(()).is_err() {
                    debug!("Shutdown reply channel closed (caller dropped)");
                }
                false
            }
        }
    }

    fn execute(&mut self, op: Operation) -> Result<Outcome> {
        let name = op.name();
        let mut engine = Engine::new(&mut self.state, &self.config);
        let result = op.apply(&mut engine);
        let events = engine.into_events();

        if let Err(err) = &result {
            warn!(
                session = %self.session,
                operation = name,
                code = err.error_code(),
                severity = err.severity().as_str(),
                "operation rejected: {err}"
            );
        }

        // a rejected knock reply can still discard its ticket
        let changed = result.is_ok() || !events.is_empty();
        self.publish(events);
        if changed {
            self.persist();
        }

        result.map_err(Into::into)
    }

    fn publish(&mut self, events: Vec<game_core::EngineEvent>) {
        for payload in events {
            let event = Event {
                session: self.session.clone(),
                sequence: self.sequence,
                payload,
            };
            self.sequence += 1;

            if self.notify_tx.send(event.clone()).is_err() {
                debug!(session = %self.session, "notification worker gone, event not delivered");
            }
            self.event_bus.publish(event);
        }
    }

    fn persist(&mut self) {
        let Some(snapshot_tx) = &self.snapshot_tx else {
            return;
        };
        self.revision += 1;
        let snapshot = Snapshot {
            revision: self.revision,
            state: self.state.clone(),
        };
        if snapshot_tx.send(snapshot).is_err() {
            warn!(session = %self.session, "persistence worker gone, snapshot not saved");
        }
    }
}
