//! Day/Night phase clock.
//!
//! The clock holds the current [`PhaseToken`] and a shared Day/Night cycle
//! counter, and linearizes the pair into an [`Epoch`] so block expiries can
//! be compared with plain integer ordering.

mod expiry;

pub use expiry::{Boundary, ExpiryError, Until};

use std::fmt;
use std::str::FromStr;

/// Errors raised while interpreting phase tokens.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseError {
    #[error("unknown phase token '{0}' (expected pregame, night, day or postgame)")]
    InvalidPhase(String),
}

impl crate::error::GameError for PhaseError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPhase(_) => "PHASE_INVALID",
        }
    }
}

/// Closed set of phase tokens.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PhaseToken {
    #[default]
    Pregame,
    Day,
    Night,
    Postgame,
}

impl PhaseToken {
    /// Administrative cycling order used by [`PhaseClock::next`].
    pub const CYCLE: [PhaseToken; 4] = [
        PhaseToken::Pregame,
        PhaseToken::Night,
        PhaseToken::Day,
        PhaseToken::Postgame,
    ];

    /// Parses a token case-insensitively, mapping failures to [`PhaseError::InvalidPhase`].
    pub fn parse(text: &str) -> Result<Self, PhaseError> {
        Self::from_str(text.trim()).map_err(|_| PhaseError::InvalidPhase(text.to_string()))
    }

    /// Returns true for the two tokens that carry a cycle number.
    pub const fn is_cycling(self) -> bool {
        matches!(self, PhaseToken::Day | PhaseToken::Night)
    }

    /// Token that follows `self` in [`PhaseToken::CYCLE`].
    pub fn successor(self) -> Self {
        let idx = Self::CYCLE
            .iter()
            .position(|token| *token == self)
            .unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }
}

/// Linear position of a Day/Night phase: `Day n -> 2(n-1)`, `Night n -> 2(n-1)+1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch(pub u32);

impl Epoch {
    /// Computes the epoch of a Day/Night phase. Pregame/postgame have none.
    pub fn of(token: PhaseToken, cycle: u32) -> Option<Self> {
        let base = cycle.max(1).saturating_sub(1).saturating_mul(2);
        match token {
            PhaseToken::Day => Some(Self(base)),
            PhaseToken::Night => Some(Self(base.saturating_add(1))),
            PhaseToken::Pregame | PhaseToken::Postgame => None,
        }
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Snapshot of the clock: token plus cycle counter.
///
/// `cycle` is always 1 for pregame/postgame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseReading {
    pub token: PhaseToken,
    pub cycle: u32,
}

impl PhaseReading {
    pub const PREGAME: Self = Self {
        token: PhaseToken::Pregame,
        cycle: 1,
    };

    pub fn new(token: PhaseToken, cycle: u32) -> Self {
        let cycle = if token.is_cycling() { cycle.max(1) } else { 1 };
        Self { token, cycle }
    }

    pub fn day(cycle: u32) -> Self {
        Self::new(PhaseToken::Day, cycle)
    }

    pub fn night(cycle: u32) -> Self {
        Self::new(PhaseToken::Night, cycle)
    }

    /// Epoch of this reading, `None` outside the Day/Night series.
    pub fn epoch(&self) -> Option<Epoch> {
        Epoch::of(self.token, self.cycle)
    }
}

impl Default for PhaseReading {
    fn default() -> Self {
        Self::PREGAME
    }
}

impl fmt::Display for PhaseReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            PhaseToken::Day => write!(f, "Day {}", self.cycle),
            PhaseToken::Night => write!(f, "Night {}", self.cycle),
            other => write!(f, "{other}"),
        }
    }
}

/// Result of moving the clock, kept for event reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseTransition {
    pub previous: PhaseReading,
    pub current: PhaseReading,
}

/// Phase clock for one game session.
///
/// Epochs increase monotonically while cycling day -> night -> day. The
/// administrative [`PhaseClock::reset_cycle`] intentionally breaks that:
/// epochs taken before a reset must not be compared with epochs after it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseClock {
    reading: PhaseReading,
    /// Count of `advance` calls over the session lifetime; unaffected by resets.
    transitions: u64,
}

impl PhaseClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a clock at a given reading (snapshots, fixtures).
    pub fn at(reading: PhaseReading) -> Self {
        Self {
            reading: PhaseReading::new(reading.token, reading.cycle),
            transitions: 0,
        }
    }

    pub fn reading(&self) -> PhaseReading {
        self.reading
    }

    pub fn token(&self) -> PhaseToken {
        self.reading.token
    }

    pub fn epoch(&self) -> Option<Epoch> {
        self.reading.epoch()
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Sets the token and updates the shared cycle counter.
    ///
    /// Entering day/night from outside the series starts at cycle 1. Within
    /// the series the counter only increments on night -> day. Leaving the
    /// series resets it to 1.
    pub fn advance(&mut self, target: PhaseToken) -> PhaseTransition {
        let previous = self.reading;
        let cycle = match (previous.token.is_cycling(), target) {
            (_, PhaseToken::Pregame | PhaseToken::Postgame) => 1,
            (false, _) => 1,
            (true, PhaseToken::Day) if previous.token == PhaseToken::Night => {
                previous.cycle.saturating_add(1)
            }
            (true, _) => previous.cycle,
        };

        self.reading = PhaseReading {
            token: target,
            cycle,
        };
        self.transitions = self.transitions.saturating_add(1);

        PhaseTransition {
            previous,
            current: self.reading,
        }
    }

    /// Advances to the successor in [`PhaseToken::CYCLE`].
    pub fn next(&mut self) -> PhaseTransition {
        self.advance(self.reading.token.successor())
    }

    /// Sets the cycle counter to 1 without touching the token.
    pub fn reset_cycle(&mut self) -> PhaseTransition {
        let previous = self.reading;
        self.reading.cycle = 1;
        PhaseTransition {
            previous,
            current: self.reading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epochs_interleave_days_and_nights() {
        for n in 1..50 {
            let day = Epoch::of(PhaseToken::Day, n).unwrap();
            let night = Epoch::of(PhaseToken::Night, n).unwrap();
            let next_day = Epoch::of(PhaseToken::Day, n + 1).unwrap();
            assert!(day < night);
            assert!(night < next_day);
        }
        assert_eq!(Epoch::of(PhaseToken::Day, 1), Some(Epoch(0)));
        assert_eq!(Epoch::of(PhaseToken::Night, 2), Some(Epoch(3)));
    }

    #[test]
    fn pregame_and_postgame_have_no_epoch() {
        assert_eq!(Epoch::of(PhaseToken::Pregame, 1), None);
        assert_eq!(Epoch::of(PhaseToken::Postgame, 4), None);
        assert_eq!(PhaseClock::new().epoch(), None);
    }

    #[test]
    fn cold_start_begins_at_cycle_one() {
        let mut clock = PhaseClock::new();
        let transition = clock.advance(PhaseToken::Night);
        assert_eq!(transition.previous, PhaseReading::PREGAME);
        assert_eq!(clock.reading(), PhaseReading::night(1));
    }

    #[test]
    fn cycle_increments_only_on_night_to_day() {
        let mut clock = PhaseClock::new();
        clock.advance(PhaseToken::Night);
        clock.advance(PhaseToken::Day);
        assert_eq!(clock.reading(), PhaseReading::day(2));

        clock.advance(PhaseToken::Night);
        assert_eq!(clock.reading(), PhaseReading::night(2));

        // repeating the same token holds the counter
        clock.advance(PhaseToken::Night);
        assert_eq!(clock.reading(), PhaseReading::night(2));
    }

    #[test]
    fn leaving_the_series_resets_cycle() {
        let mut clock = PhaseClock::at(PhaseReading::night(3));
        clock.advance(PhaseToken::Postgame);
        assert_eq!(clock.reading(), PhaseReading::new(PhaseToken::Postgame, 1));
        clock.advance(PhaseToken::Day);
        assert_eq!(clock.reading(), PhaseReading::day(1));
    }

    #[test]
    fn next_follows_administrative_cycle() {
        let mut clock = PhaseClock::new();
        let tokens: Vec<_> = (0..5).map(|_| clock.next().current.token).collect();
        assert_eq!(
            tokens,
            vec![
                PhaseToken::Night,
                PhaseToken::Day,
                PhaseToken::Postgame,
                PhaseToken::Pregame,
                PhaseToken::Night,
            ]
        );
        assert_eq!(clock.transitions(), 5);
    }

    #[test]
    fn reset_cycle_keeps_token() {
        let mut clock = PhaseClock::at(PhaseReading::day(4));
        let transition = clock.reset_cycle();
        assert_eq!(transition.previous, PhaseReading::day(4));
        assert_eq!(clock.reading(), PhaseReading::day(1));
        assert_eq!(clock.transitions(), 0);
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert_eq!(PhaseToken::parse("NIGHT"), Ok(PhaseToken::Night));
        assert_eq!(PhaseToken::parse(" day "), Ok(PhaseToken::Day));
        assert_eq!(
            PhaseToken::parse("dusk"),
            Err(PhaseError::InvalidPhase("dusk".into()))
        );
    }

    #[test]
    fn display_includes_cycle_for_day_and_night() {
        assert_eq!(PhaseReading::night(2).to_string(), "Night 2");
        assert_eq!(PhaseReading::day(1).to_string(), "Day 1");
        assert_eq!(PhaseReading::PREGAME.to_string(), "pregame");
    }
}
