//! Time-bounded blocks on abilities and on whole locations.
//!
//! Each location owns one record holding its ability blocks and an optional
//! "all visits" block. Records are dropped once both are empty.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::ability::AbilityKey;
use crate::phase::{Boundary, PhaseReading, Until};
use crate::state::LocationId;

/// Lifetime of a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockSpan {
    pub until: Until,
    pub boundary: Boundary,
}

impl BlockSpan {
    pub fn new(until: Until, boundary: Boundary) -> Self {
        Self { until, boundary }
    }

    pub fn forever() -> Self {
        Self::default()
    }

    /// Whether this span has run out at `reading`.
    ///
    /// Forever spans and readings without an epoch never expire. Spans whose
    /// expiry cannot be resolved are kept, with a warning.
    fn has_expired(&self, key: &BlockKey, reading: PhaseReading) -> bool {
        let Some(now) = reading.epoch() else {
            return false;
        };
        match self.until.resolve() {
            Ok(Some(until)) => self.boundary.has_elapsed(until, now),
            Ok(None) => false,
            Err(err) => {
                warn!(
                    target: "game_core::blocks",
                    block = %key,
                    error = %err,
                    "keeping block with unparsable expiry"
                );
                false
            }
        }
    }
}

/// Identifies one stored block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockKey {
    Ability {
        location: LocationId,
        ability: AbilityKey,
    },
    LocationVisits {
        location: LocationId,
    },
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKey::Ability { location, ability } => write!(f, "{location}/{ability}"),
            BlockKey::LocationVisits { location } => write!(f, "{location}/visits"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct LocationBlocks {
    abilities: BTreeMap<AbilityKey, BlockSpan>,
    visits: Option<BlockSpan>,
}

impl LocationBlocks {
    fn is_empty(&self) -> bool {
        self.abilities.is_empty() && self.visits.is_none()
    }
}

/// Block store for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockRegistry {
    locations: BTreeMap<LocationId, LocationBlocks>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks one ability, replacing any existing span for it.
    pub fn block_ability(&mut self, location: LocationId, ability: AbilityKey, span: BlockSpan) {
        self.locations
            .entry(location)
            .or_default()
            .abilities
            .insert(ability, span);
    }

    /// Returns the removed span, if the ability was blocked.
    pub fn unblock_ability(&mut self, location: LocationId, ability: AbilityKey) -> Option<BlockSpan> {
        let record = self.locations.get_mut(&location)?;
        let removed = record.abilities.remove(&ability);
        self.prune(location);
        removed
    }

    pub fn block_location_visits(&mut self, location: LocationId, span: BlockSpan) {
        self.locations.entry(location).or_default().visits = Some(span);
    }

    pub fn unblock_location_visits(&mut self, location: LocationId) -> Option<BlockSpan> {
        let record = self.locations.get_mut(&location)?;
        let removed = record.visits.take();
        self.prune(location);
        removed
    }

    pub fn is_ability_blocked(&self, location: LocationId, ability: AbilityKey) -> bool {
        self.locations
            .get(&location)
            .is_some_and(|record| record.abilities.contains_key(&ability))
    }

    pub fn is_location_visit_blocked(&self, location: LocationId) -> bool {
        self.locations
            .get(&location)
            .is_some_and(|record| record.visits.is_some())
    }

    pub fn get(&self, key: BlockKey) -> Option<&BlockSpan> {
        match key {
            BlockKey::Ability { location, ability } => {
                self.locations.get(&location)?.abilities.get(&ability)
            }
            BlockKey::LocationVisits { location } => self.locations.get(&location)?.visits.as_ref(),
        }
    }

    /// All stored blocks in key order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockKey, &BlockSpan)> {
        self.locations.iter().flat_map(|(location, record)| {
            let location = *location;
            let abilities = record.abilities.iter().map(move |(ability, span)| {
                (
                    BlockKey::Ability {
                        location,
                        ability: *ability,
                    },
                    span,
                )
            });
            let visits = record
                .visits
                .iter()
                .map(move |span| (BlockKey::LocationVisits { location }, span));
            abilities.chain(visits)
        })
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Removes every block that has expired at `reading` and returns their keys.
    ///
    /// A reading without an epoch (pregame/postgame) removes nothing.
    pub fn sweep(&mut self, reading: PhaseReading) -> Vec<BlockKey> {
        if reading.epoch().is_none() {
            return Vec::new();
        }

        let expired: Vec<BlockKey> = self
            .iter()
            .filter(|(key, span)| span.has_expired(key, reading))
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            match *key {
                BlockKey::Ability { location, ability } => {
                    self.unblock_ability(location, ability);
                }
                BlockKey::LocationVisits { location } => {
                    self.unblock_location_visits(location);
                }
            }
        }
        expired
    }

    fn prune(&mut self, location: LocationId) {
        if self
            .locations
            .get(&location)
            .is_some_and(LocationBlocks::is_empty)
        {
            self.locations.remove(&location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOC: LocationId = LocationId(4);
    const KEY: AbilityKey = AbilityKey(1);

    fn until_night2(boundary: Boundary) -> BlockSpan {
        BlockSpan::new(Until::night(2), boundary)
    }

    #[test]
    fn end_boundary_survives_its_own_phase() {
        let mut blocks = BlockRegistry::new();
        blocks.block_ability(LOC, KEY, until_night2(Boundary::End));

        assert!(blocks.sweep(PhaseReading::night(2)).is_empty());
        assert!(blocks.is_ability_blocked(LOC, KEY));

        let removed = blocks.sweep(PhaseReading::day(3));
        assert_eq!(
            removed,
            vec![BlockKey::Ability {
                location: LOC,
                ability: KEY
            }]
        );
        assert!(!blocks.is_ability_blocked(LOC, KEY));
        assert!(blocks.is_empty());
    }

    #[test]
    fn beginning_boundary_lifts_when_phase_starts() {
        let mut blocks = BlockRegistry::new();
        blocks.block_location_visits(LOC, until_night2(Boundary::Beginning));

        assert!(blocks.sweep(PhaseReading::day(2)).is_empty());
        assert!(blocks.is_location_visit_blocked(LOC));

        assert_eq!(
            blocks.sweep(PhaseReading::night(2)),
            vec![BlockKey::LocationVisits { location: LOC }]
        );
        assert!(!blocks.is_location_visit_blocked(LOC));
    }

    #[test]
    fn forever_and_unparsable_blocks_are_never_swept() {
        let mut blocks = BlockRegistry::new();
        blocks.block_ability(LOC, KEY, BlockSpan::forever());
        blocks.block_ability(
            LOC,
            AbilityKey(2),
            BlockSpan::new(Until::parse("whenever"), Boundary::Beginning),
        );

        assert!(blocks.sweep(PhaseReading::night(40)).is_empty());
        assert_eq!(blocks.len(), 2);

        // explicit removal still works
        assert!(blocks.unblock_ability(LOC, AbilityKey(2)).is_some());
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn sweep_is_idempotent() {
        let mut blocks = BlockRegistry::new();
        blocks.block_ability(LOC, KEY, BlockSpan::new(Until::day(1), Boundary::End));
        blocks.block_location_visits(LOC, BlockSpan::new(Until::night(1), Boundary::Beginning));

        let reading = PhaseReading::night(1);
        assert_eq!(blocks.sweep(reading).len(), 2);
        assert!(blocks.sweep(reading).is_empty());
    }

    #[test]
    fn pregame_reading_removes_nothing() {
        let mut blocks = BlockRegistry::new();
        blocks.block_ability(LOC, KEY, BlockSpan::new(Until::day(1), Boundary::Beginning));
        assert!(blocks.sweep(PhaseReading::PREGAME).is_empty());
        assert!(blocks.is_ability_blocked(LOC, KEY));
    }

    #[test]
    fn ability_and_visit_blocks_share_a_record() {
        let mut blocks = BlockRegistry::new();
        blocks.block_ability(LOC, KEY, BlockSpan::forever());
        blocks.block_location_visits(LOC, BlockSpan::forever());

        blocks.unblock_location_visits(LOC);
        assert!(blocks.is_ability_blocked(LOC, KEY));
        assert!(!blocks.is_location_visit_blocked(LOC));

        blocks.unblock_ability(LOC, KEY);
        assert!(blocks.is_empty());
    }
}
