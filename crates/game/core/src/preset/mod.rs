//! Saved action templates per location.
//!
//! A preset is free text an owner keeps ready for a later submission. When
//! the text starts with an ability key that the location owns, the preset
//! remembers that ability together with its category and the location's team
//! as they were when it was saved.

use std::collections::BTreeMap;

use crate::ability::{AbilityKey, Category, Team};
use crate::state::LocationId;

/// Presets shown per listing page.
pub const PRESET_PAGE_SIZE: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PresetError {
    #[error("{0} has no presets")]
    NoPresets(LocationId),

    #[error("preset position {position} out of range for {location} ({len} presets)")]
    OutOfRange {
        location: LocationId,
        position: usize,
        len: usize,
    },
}

impl crate::error::GameError for PresetError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoPresets(_) => "PRESET_NONE",
            Self::OutOfRange { .. } => "PRESET_OUT_OF_RANGE",
        }
    }
}

/// Ability metadata captured when the preset text names a known ability.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresetAbility {
    pub key: AbilityKey,
    pub category: Category,
    pub team: Option<Team>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Preset {
    pub text: String,
    pub ability: Option<PresetAbility>,
    /// Strictly increasing per session.
    pub saved_at: u64,
}

/// One page of a location's presets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresetPage {
    pub location: LocationId,
    /// 1-based.
    pub page: usize,
    pub pages: usize,
    /// 1-based position of the first entry.
    pub first: usize,
    pub entries: Vec<Preset>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresetBook {
    entries: BTreeMap<LocationId, Vec<Preset>>,
    next_seq: u64,
}

impl PresetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a preset and returns its 1-based position.
    pub fn add(
        &mut self,
        location: LocationId,
        text: impl Into<String>,
        ability: Option<PresetAbility>,
    ) -> usize {
        self.next_seq += 1;
        let list = self.entries.entry(location).or_default();
        list.push(Preset {
            text: text.into(),
            ability,
            saved_at: self.next_seq,
        });
        list.len()
    }

    pub fn list(&self, location: LocationId) -> &[Preset] {
        self.entries
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns page `page` (1-based, clamped to the last page).
    pub fn page(&self, location: LocationId, page: usize) -> Result<PresetPage, PresetError> {
        let list = self.non_empty(location)?;
        let pages = list.len().div_ceil(PRESET_PAGE_SIZE);
        let page = page.clamp(1, pages);
        let start = (page - 1) * PRESET_PAGE_SIZE;
        let end = (start + PRESET_PAGE_SIZE).min(list.len());
        Ok(PresetPage {
            location,
            page,
            pages,
            first: start + 1,
            entries: list[start..end].to_vec(),
        })
    }

    /// Moves the preset at `from` to `to`, both 1-based.
    ///
    /// A `to` one past the end moves the preset to the back.
    pub fn move_preset(
        &mut self,
        location: LocationId,
        from: usize,
        to: usize,
    ) -> Result<(), PresetError> {
        let list = self
            .entries
            .get_mut(&location)
            .filter(|list| !list.is_empty())
            .ok_or(PresetError::NoPresets(location))?;
        let len = list.len();
        let out_of_range = |position| PresetError::OutOfRange {
            location,
            position,
            len,
        };
        if from == 0 || from > len {
            return Err(out_of_range(from));
        }
        if to == 0 || to > len + 1 {
            return Err(out_of_range(to));
        }

        let preset = list.remove(from - 1);
        let at = (to - 1).min(list.len());
        list.insert(at, preset);
        Ok(())
    }

    /// Removes the preset at 1-based `position`.
    pub fn remove(&mut self, location: LocationId, position: usize) -> Result<Preset, PresetError> {
        let list = self
            .entries
            .get_mut(&location)
            .filter(|list| !list.is_empty())
            .ok_or(PresetError::NoPresets(location))?;
        let len = list.len();
        if position == 0 || position > len {
            return Err(PresetError::OutOfRange {
                location,
                position,
                len,
            });
        }
        let preset = list.remove(position - 1);
        if list.is_empty() {
            self.entries.remove(&location);
        }
        Ok(preset)
    }

    /// Every location with presets, in location order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &[Preset])> + '_ {
        self.entries
            .iter()
            .map(|(location, list)| (*location, list.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn non_empty(&self, location: LocationId) -> Result<&[Preset], PresetError> {
        let list = self.list(location);
        if list.is_empty() {
            return Err(PresetError::NoPresets(location));
        }
        Ok(list)
    }
}
