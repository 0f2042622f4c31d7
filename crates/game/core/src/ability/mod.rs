//! Ability assignments owned by locations.
//!
//! Ability keys arrive as `"1"` or `"A1"`; both parse to the same
//! [`AbilityKey`] and only the canonical number is stored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::state::LocationId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityError {
    #[error("invalid ability key '{0}' (expected a number or A<number>)")]
    InvalidAbilityKey(String),

    #[error("unknown ability category '{0}'")]
    UnknownCategory(String),

    #[error("{location} already has ability number {key}")]
    DuplicateAbilityNumber { location: LocationId, key: AbilityKey },

    #[error("{location} has no ability {key}")]
    AbilityNotFound { location: LocationId, key: AbilityKey },
}

impl crate::error::GameError for AbilityError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAbilityKey(_) => "ABILITY_INVALID_KEY",
            Self::UnknownCategory(_) => "ABILITY_UNKNOWN_CATEGORY",
            Self::DuplicateAbilityNumber { .. } => "ABILITY_DUPLICATE_NUMBER",
            Self::AbilityNotFound { .. } => "ABILITY_NOT_FOUND",
        }
    }
}

/// Canonical ability identifier, displayed as `A<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityKey(pub u32);

impl AbilityKey {
    pub fn parse(text: &str) -> Result<Self, AbilityError> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix(['A', 'a'])
            .unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AbilityError::InvalidAbilityKey(text.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| AbilityError::InvalidAbilityKey(text.to_string()))
    }
}

impl FromStr for AbilityKey {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Closed set of ability categories.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Category {
    #[strum(to_string = "manipulation", serialize = "manip")]
    Manipulation,
    #[strum(to_string = "protection", serialize = "prot")]
    Protection,
    #[strum(to_string = "blocking", serialize = "block")]
    Blocking,
    #[strum(to_string = "curing", serialize = "cure")]
    Curing,
    #[strum(to_string = "information", serialize = "info")]
    Information,
    #[strum(to_string = "economy", serialize = "eco", serialize = "econ")]
    Economy,
    #[strum(to_string = "transport", serialize = "transportation")]
    Transport,
    Communication,
    Lethal,
    Other,
}

impl Category {
    /// Priority used when a category has no entry in the resolution table.
    pub const UNRANKED: u8 = 99;

    pub fn parse(text: &str) -> Result<Self, AbilityError> {
        Self::from_str(text.trim()).map_err(|_| AbilityError::UnknownCategory(text.to_string()))
    }

    /// Resolution priority; lower resolves first.
    pub const fn priority(self) -> u8 {
        match self {
            Category::Manipulation => 1,
            Category::Blocking => 2,
            Category::Protection => 3,
            Category::Curing => 4,
            Category::Lethal => 5,
            Category::Other => 6,
            Category::Transport => 7,
            Category::Information | Category::Economy | Category::Communication => {
                Self::UNRANKED
            }
        }
    }
}

/// Team name, stored lower-cased.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Team(String);

impl Team {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ability owned by a location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityAssignment {
    pub key: AbilityKey,
    pub category: Category,
    /// Free-form usage count text, e.g. `"1/night"` or `"x2"`.
    pub uses: String,
}

/// Abilities and team membership per location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityRegistry {
    abilities: BTreeMap<LocationId, BTreeMap<AbilityKey, AbilityAssignment>>,
    teams: BTreeMap<LocationId, Team>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ability. Fails without mutating if the number is taken.
    pub fn assign(
        &mut self,
        location: LocationId,
        key: AbilityKey,
        category: Category,
        uses: impl Into<String>,
    ) -> Result<&AbilityAssignment, AbilityError> {
        let owned = self.abilities.entry(location).or_default();
        if owned.contains_key(&key) {
            return Err(AbilityError::DuplicateAbilityNumber { location, key });
        }
        let assignment = AbilityAssignment {
            key,
            category,
            uses: uses.into(),
        };
        Ok(owned.entry(key).or_insert(assignment))
    }

    pub fn update_category(
        &mut self,
        location: LocationId,
        key: AbilityKey,
        category: Category,
    ) -> Result<(), AbilityError> {
        let assignment = self
            .abilities
            .get_mut(&location)
            .and_then(|owned| owned.get_mut(&key))
            .ok_or(AbilityError::AbilityNotFound { location, key })?;
        assignment.category = category;
        Ok(())
    }

    /// Removes one ability; siblings keep their numbers.
    pub fn remove(
        &mut self,
        location: LocationId,
        key: AbilityKey,
    ) -> Result<AbilityAssignment, AbilityError> {
        let owned = self
            .abilities
            .get_mut(&location)
            .ok_or(AbilityError::AbilityNotFound { location, key })?;
        let removed = owned
            .remove(&key)
            .ok_or(AbilityError::AbilityNotFound { location, key })?;
        if owned.is_empty() {
            self.abilities.remove(&location);
        }
        Ok(removed)
    }

    pub fn get(&self, location: LocationId, key: AbilityKey) -> Option<&AbilityAssignment> {
        self.abilities.get(&location)?.get(&key)
    }

    pub fn abilities(&self, location: LocationId) -> impl Iterator<Item = &AbilityAssignment> {
        self.abilities
            .get(&location)
            .into_iter()
            .flat_map(|owned| owned.values())
    }

    pub fn assign_team(&mut self, location: LocationId, team: Team) {
        self.teams.insert(location, team);
    }

    pub fn team(&self, location: LocationId) -> Option<&Team> {
        self.teams.get(&location)
    }
}
