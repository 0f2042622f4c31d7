//! Visit tokens: per-holder counters for the four consumable kinds.
//!
//! Counters are non-negative. Grants that would push a counter below zero
//! clamp it to zero; consumption of an empty counter returns `false` rather
//! than erroring, since running out of visits is ordinary control flow.

use std::collections::BTreeMap;
use std::fmt;

use crate::phase::PhaseToken;
use crate::state::{ActorId, LocationId};

/// Consumable visit kind.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VisitKind {
    #[strum(to_string = "ordinary", serialize = "regular")]
    Ordinary,
    Stealth,
    Forced,
    /// Counts as both stealth and forced.
    #[strum(to_string = "combined", serialize = "both")]
    Combined,
}

impl VisitKind {
    /// Order in which [`TokenInventory::consume_preferred`] tries the kinds.
    pub const PREFERENCE: [VisitKind; 4] = [
        VisitKind::Ordinary,
        VisitKind::Stealth,
        VisitKind::Forced,
        VisitKind::Combined,
    ];

    /// Visit kind a plain knock spends in the given phase.
    ///
    /// Only day and night hand out visits.
    pub fn for_phase(token: PhaseToken) -> Option<VisitKind> {
        token.is_cycling().then_some(VisitKind::Ordinary)
    }
}

/// Counter set of one holder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisitCounts {
    pub ordinary: u32,
    pub stealth: u32,
    pub forced: u32,
    pub combined: u32,
}

impl VisitCounts {
    pub fn get(&self, kind: VisitKind) -> u32 {
        match kind {
            VisitKind::Ordinary => self.ordinary,
            VisitKind::Stealth => self.stealth,
            VisitKind::Forced => self.forced,
            VisitKind::Combined => self.combined,
        }
    }

    fn slot_mut(&mut self, kind: VisitKind) -> &mut u32 {
        match kind {
            VisitKind::Ordinary => &mut self.ordinary,
            VisitKind::Stealth => &mut self.stealth,
            VisitKind::Forced => &mut self.forced,
            VisitKind::Combined => &mut self.combined,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for VisitCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ordinary={} stealth={} forced={} combined={}",
            self.ordinary, self.stealth, self.forced, self.combined
        )
    }
}

/// Ordinary visits handed out at the start of each night and day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Income {
    pub night: u32,
    pub day: u32,
}

impl Income {
    pub const fn new(night: u32, day: u32) -> Self {
        Self { night, day }
    }

    pub fn for_phase(&self, token: PhaseToken) -> Option<u32> {
        match token {
            PhaseToken::Night => Some(self.night),
            PhaseToken::Day => Some(self.day),
            PhaseToken::Pregame | PhaseToken::Postgame => None,
        }
    }
}

/// Owner of a counter set.
///
/// Actors spend visits when knocking; locations hold the shared pool drawn
/// on by resolved actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Holder {
    Actor(ActorId),
    Location(LocationId),
}

impl From<ActorId> for Holder {
    fn from(actor: ActorId) -> Self {
        Holder::Actor(actor)
    }
}

impl From<LocationId> for Holder {
    fn from(location: LocationId) -> Self {
        Holder::Location(location)
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Actor(actor) => write!(f, "{actor}"),
            Holder::Location(location) => write!(f, "{location}"),
        }
    }
}

/// Visit counters and incomes for one session.
///
/// Holders whose counters are all zero are not stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenInventory {
    counts: BTreeMap<Holder, VisitCounts>,
    incomes: BTreeMap<ActorId, Income>,
}

impl TokenInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` (possibly negative) to a counter, clamping at zero.
    ///
    /// Returns the stored value after the change.
    pub fn grant(&mut self, holder: impl Into<Holder>, kind: VisitKind, amount: i64) -> u32 {
        let holder = holder.into();
        let mut counts = self.counts(holder);
        let slot = counts.slot_mut(kind);
        let updated = i64::from(*slot)
            .saturating_add(amount)
            .clamp(0, i64::from(u32::MAX));
        *slot = u32::try_from(updated).unwrap_or(u32::MAX);
        let value = *slot;
        self.store(holder, counts);
        value
    }

    /// Removes up to `amount` tokens, flooring the counter at zero.
    pub fn remove(&mut self, holder: impl Into<Holder>, kind: VisitKind, amount: u32) -> u32 {
        self.grant(holder, kind, -i64::from(amount))
    }

    pub fn has(&self, holder: impl Into<Holder>, kind: VisitKind) -> bool {
        self.counts(holder).get(kind) > 0
    }

    /// Decrements the counter iff it is positive; returns whether it did.
    pub fn consume(&mut self, holder: impl Into<Holder>, kind: VisitKind) -> bool {
        let holder = holder.into();
        let mut counts = self.counts(holder);
        let slot = counts.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        self.store(holder, counts);
        true
    }

    /// Spends one visit of whichever kind comes first in [`VisitKind::PREFERENCE`].
    pub fn consume_preferred(&mut self, holder: impl Into<Holder>) -> Option<VisitKind> {
        let holder = holder.into();
        VisitKind::PREFERENCE
            .into_iter()
            .find(|kind| self.consume(holder, *kind))
    }

    /// Resets every income-holding actor's ordinary counter to their income
    /// for `token`. No-op outside day/night.
    ///
    /// Returns the actors whose counters were set.
    pub fn refill_for_phase(&mut self, token: PhaseToken) -> Vec<ActorId> {
        let targets: Vec<(ActorId, u32)> = self
            .incomes
            .iter()
            .filter_map(|(actor, income)| income.for_phase(token).map(|value| (*actor, value)))
            .collect();

        for (actor, value) in &targets {
            let holder = Holder::Actor(*actor);
            let mut counts = self.counts(holder);
            counts.ordinary = *value;
            self.store(holder, counts);
        }

        targets.into_iter().map(|(actor, _)| actor).collect()
    }

    pub fn set_income(&mut self, actor: ActorId, income: Income) {
        self.incomes.insert(actor, income);
    }

    pub fn income(&self, actor: ActorId) -> Option<Income> {
        self.incomes.get(&actor).copied()
    }

    pub fn counts(&self, holder: impl Into<Holder>) -> VisitCounts {
        self.counts.get(&holder.into()).copied().unwrap_or_default()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Holder, &VisitCounts)> {
        self.counts.iter()
    }

    fn store(&mut self, holder: Holder, counts: VisitCounts) {
        if counts.is_empty() {
            self.counts.remove(&holder);
        } else {
            self.counts.insert(holder, counts);
        }
    }
}
