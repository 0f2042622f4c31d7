//! Session orchestration for the resolution engine.
//!
//! This crate runs each game session as a single-writer worker task and
//! wires together command channels, the event bus, outbound notification
//! and snapshot repositories. Consumers embed [`Runtime`] to open sessions
//! and drive them through [`SessionHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`workers`] keeps background tasks internal to the crate
//! - [`repository`] stores session snapshots
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod types;

mod workers;

pub use api::{
    Notifier, NullNotifier, Operation, Outcome, Result, RuntimeError, SessionHandle,
    TracingNotifier,
};
pub use events::{Event, EventBus, Topic};
pub use repository::{FileStateRepository, InMemoryStateRepo, RepositoryError, StateRepository};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use types::{SessionId, StateHash};
