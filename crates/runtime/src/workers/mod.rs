//! Worker tasks that back the runtime orchestration.
//!
//! Each open session runs three tasks: the session worker applies commands,
//! the notification worker forwards events to the configured notifier, and
//! the persistence worker (when a repository is configured) stores the
//! latest snapshot.

mod notification;
mod persistence;
mod session;

pub use notification::NotificationWorker;
pub use persistence::{PersistenceWorker, Snapshot};
pub use session::{Command, SessionWorker};
