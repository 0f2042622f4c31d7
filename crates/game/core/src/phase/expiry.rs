//! Block lifetimes expressed relative to the phase clock.

use std::fmt;

use super::{Epoch, PhaseToken};

/// Raised when an expiry cannot be placed on the epoch line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpiryError {
    #[error("unparsable expiry '{0}'")]
    UnparsableExpiry(String),
}

impl crate::error::GameError for ExpiryError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnparsableExpiry(_) => "EXPIRY_UNPARSABLE",
        }
    }
}

/// Whether a block lifts at the start or at the end of its target phase.
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
pub enum Boundary {
    #[strum(to_string = "beginning", serialize = "start")]
    Beginning,
    #[default]
    End,
}

impl Boundary {
    /// Expiry rule: `end` needs the clock strictly past the target epoch,
    /// `beginning` lifts as soon as the clock reaches it.
    pub fn has_elapsed(self, until: Epoch, now: Epoch) -> bool {
        match self {
            Boundary::End => now > until,
            Boundary::Beginning => now >= until,
        }
    }
}

/// Target phase of a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Until {
    /// Never expires through clock advancement; only explicit removal clears it.
    #[default]
    Forever,
    /// A Day/Night phase, e.g. Night 2.
    Phase { token: PhaseToken, cycle: u32 },
    /// Text that could not be interpreted. Kept verbatim so it never silently unblocks.
    Unparsed(String),
}

impl Until {
    pub fn day(cycle: u32) -> Self {
        Self::Phase {
            token: PhaseToken::Day,
            cycle,
        }
    }

    pub fn night(cycle: u32) -> Self {
        Self::Phase {
            token: PhaseToken::Night,
            cycle,
        }
    }

    /// Interprets operator text: `forever`, `n2`, `d3`, `n 2`, `night 2`, `Day2`.
    ///
    /// Never fails; anything else becomes [`Until::Unparsed`].
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_ascii_lowercase();
        if normalized == "forever" {
            return Self::Forever;
        }

        let split = normalized
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(normalized.len());
        let (word, digits) = normalized.split_at(split);
        let token = match word.trim_end() {
            "d" | "day" => Some(PhaseToken::Day),
            "n" | "night" => Some(PhaseToken::Night),
            _ => None,
        };

        match (token, digits.parse::<u32>()) {
            (Some(token), Ok(cycle)) if cycle >= 1 => Self::Phase { token, cycle },
            _ => Self::Unparsed(text.to_string()),
        }
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, Self::Forever)
    }

    /// Places this expiry on the epoch line. `Ok(None)` means it never expires.
    pub fn resolve(&self) -> Result<Option<Epoch>, ExpiryError> {
        match self {
            Self::Forever => Ok(None),
            Self::Phase { token, cycle } => Epoch::of(*token, *cycle)
                .map(Some)
                .ok_or_else(|| ExpiryError::UnparsableExpiry(self.to_string())),
            Self::Unparsed(text) => Err(ExpiryError::UnparsableExpiry(text.clone())),
        }
    }
}

impl fmt::Display for Until {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => write!(f, "forever"),
            Self::Phase {
                token: PhaseToken::Day,
                cycle,
            } => write!(f, "d{cycle}"),
            Self::Phase {
                token: PhaseToken::Night,
                cycle,
            } => write!(f, "n{cycle}"),
            Self::Phase { token, cycle } => write!(f, "{token}{cycle}"),
            Self::Unparsed(text) => write!(f, "{text}"),
        }
    }
}
