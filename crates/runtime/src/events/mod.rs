//! Topic-based event routing for session workers.
//!
//! Every [`game_core::EngineEvent`] a command raises is wrapped in an
//! [`Event`] tagged with its session and published on the matching
//! [`Topic`].

mod bus;

pub use bus::{Event, EventBus, Topic};
