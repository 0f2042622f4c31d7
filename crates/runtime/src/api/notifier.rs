//! Outbound delivery of session events.
//!
//! A [`Notifier`] is the seam to whatever carries announcements to players
//! (a chat bot, a web socket, a log). The runtime calls it from a dedicated
//! task, so a slow notifier never holds up command processing.

use async_trait::async_trait;
use tracing::info;

use super::errors::Result;
use crate::events::Event;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<()>;
}

/// Writes every event to the tracing log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &Event) -> Result<()> {
        let payload = serde_json::to_string(&event.payload)
            .unwrap_or_else(|err| format!("<unserializable: {err}>"));
        info!(
            target: "runtime::notify",
            session = %event.session,
            sequence = event.sequence,
            kind = event.payload.name(),
            %payload,
            "event"
        );
        Ok(())
    }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}
