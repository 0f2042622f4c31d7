//! Forwards session events to a [`Notifier`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::api::Notifier;
use crate::events::Event;

/// Drains the event queue of one session into the notifier.
///
/// Exits once the session worker drops its sender and every queued event
/// has been offered to the notifier.
pub struct NotificationWorker {
    notifier: Arc<dyn Notifier>,
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl NotificationWorker {
    pub fn new(notifier: Arc<dyn Notifier>, event_rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { notifier, event_rx }
    }

    pub async fn run(mut self) {
        while let Some(event) = self.event_rx.recv().await {
            if let Err(err) = self.notifier.notify(&event).await {
                warn!(
                    session = %event.session,
                    sequence = event.sequence,
                    kind = event.payload.name(),
                    "notification failed: {err}"
                );
            }
        }
    }
}
