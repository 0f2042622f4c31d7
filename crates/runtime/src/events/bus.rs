//! Topic-based event bus implementation.

use std::collections::HashMap;

use game_core::EngineEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::SessionId;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Applied and skipped queue actions
    Resolution,
    /// Clock advances, resets, refills and block expiry
    Phase,
    /// Knock tickets and their outcomes
    Knock,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Resolution, Topic::Phase, Topic::Knock];
}

/// Engine event tagged with the session that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub session: SessionId,
    /// Position of the event within its session, starting at zero.
    pub sequence: u64,
    pub payload: EngineEvent,
}

impl Event {
    pub fn topic(&self) -> Topic {
        match &self.payload {
            EngineEvent::ActionApplied { .. } | EngineEvent::ActionSkipped { .. } => {
                Topic::Resolution
            }
            EngineEvent::PhaseAdvanced { .. }
            | EngineEvent::PhaseCounterReset { .. }
            | EngineEvent::VisitsRefilled { .. }
            | EngineEvent::BlockExpired { .. } => Topic::Phase,
            EngineEvent::KnockRequested { .. } | EngineEvent::KnockResolved { .. } => Topic::Knock,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    resolution: broadcast::Sender<Event>,
    phase: broadcast::Sender<Event>,
    knock: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            resolution: broadcast::channel(capacity).0,
            phase: broadcast::channel(capacity).0,
            knock: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Resolution => &self.resolution,
            Topic::Phase => &self.phase,
            Topic::Knock => &self.knock,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{BlockKey, LocationId};

    fn event(payload: EngineEvent) -> Event {
        Event {
            session: "s1".into(),
            sequence: 0,
            payload,
        }
    }

    #[tokio::test]
    async fn events_only_reach_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut phase = bus.subscribe(Topic::Phase);
        let mut knock = bus.subscribe(Topic::Knock);

        let expired = event(EngineEvent::BlockExpired {
            key: BlockKey::LocationVisits {
                location: LocationId(3),
            },
        });
        bus.publish(expired.clone());

        assert_eq!(phase.recv().await.unwrap(), expired);
        assert!(knock.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(event(EngineEvent::VisitsRefilled {
            token: game_core::PhaseToken::Night,
            actors: Vec::new(),
        }));
        assert_eq!(bus.subscriber_count(Topic::Phase), 0);
    }

    #[test]
    fn subscribe_multiple_covers_each_topic() {
        let bus = EventBus::new();
        let receivers = bus.subscribe_multiple(&Topic::ALL);
        assert_eq!(receivers.len(), 3);
        assert_eq!(bus.subscriber_count(Topic::Resolution), 1);
    }
}
