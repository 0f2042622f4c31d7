use std::collections::BTreeMap;

use super::{ActorId, LocationId};

/// Current location of every placed actor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Whereabouts {
    positions: BTreeMap<ActorId, LocationId>,
}

impl Whereabouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locate(&self, actor: ActorId) -> Option<LocationId> {
        self.positions.get(&actor).copied()
    }

    /// Moves the actor, returning where they were.
    pub fn place(&mut self, actor: ActorId, location: LocationId) -> Option<LocationId> {
        self.positions.insert(actor, location)
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<LocationId> {
        self.positions.remove(&actor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, LocationId)> + '_ {
        self.positions.iter().map(|(actor, at)| (*actor, *at))
    }
}
