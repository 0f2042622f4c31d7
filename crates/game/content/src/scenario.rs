//! Scenario seed format.
//!
//! Values stay textual (`"A1"`, `"prot"`, `"n2"`) so seed files read like
//! the commands an operator would type; they are parsed while applying.

use game_core::{
    AbilityError, AbilityKey, ActorId, BlockSpan, Boundary, Category, Engine, EngineError, Income,
    LocationId, PhaseError, PhaseToken, Team, Until, VisitKind,
};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("location {location}: {source}")]
    Ability {
        location: LocationId,
        #[source]
        source: AbilityError,
    },

    #[error("invalid boundary '{0}' (expected beginning or end)")]
    InvalidBoundary(String),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VisitSeed {
    pub ordinary: u32,
    pub stealth: u32,
    pub forced: u32,
    pub combined: u32,
}

impl VisitSeed {
    fn grants(&self) -> [(VisitKind, u32); 4] {
        [
            (VisitKind::Ordinary, self.ordinary),
            (VisitKind::Stealth, self.stealth),
            (VisitKind::Forced, self.forced),
            (VisitKind::Combined, self.combined),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct AbilitySeed {
    pub key: String,
    pub category: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub uses: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct LocationSeed {
    pub id: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub team: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Vec<AbilitySeed>,
    /// Shared pool drawn on by resolved actions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visits: VisitSeed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct IncomeSeed {
    pub night: u32,
    pub day: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct ActorSeed {
    pub id: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub income: Option<IncomeSeed>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub visits: VisitSeed,
}

/// Starting block. Without `ability` it blocks all visits to the location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct BlockSeed {
    pub location: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability: Option<String>,
    pub until: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub boundary: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScenarioSeed {
    /// Phase to enter once everything is seeded.
    pub phase: Option<String>,
    pub locations: Vec<LocationSeed>,
    pub actors: Vec<ActorSeed>,
    pub blocks: Vec<BlockSeed>,
}

impl ScenarioSeed {
    /// Seeds a session through the engine.
    ///
    /// Stops at the first invalid entry; entries before it stay applied.
    pub fn apply(&self, engine: &mut Engine<'_>) -> Result<(), ScenarioError> {
        for entry in &self.locations {
            let location = LocationId(entry.id);
            if let Some(team) = &entry.team {
                engine.assign_team(location, Team::new(team));
            }
            for ability in &entry.abilities {
                let wrap = |source| ScenarioError::Ability { location, source };
                let key = AbilityKey::parse(&ability.key).map_err(wrap)?;
                let category = Category::parse(&ability.category).map_err(wrap)?;
                engine.assign_ability(location, key, category, ability.uses.clone())?;
            }
            for (kind, amount) in entry.visits.grants() {
                if amount > 0 {
                    engine.grant_visits(location, kind, amount);
                }
            }
        }

        for entry in &self.actors {
            let actor = ActorId(entry.id);
            if let Some(location) = entry.location {
                engine.place_actor(actor, LocationId(location));
            }
            if let Some(income) = entry.income {
                engine.set_income(actor, Income::new(income.night, income.day));
            }
            for (kind, amount) in entry.visits.grants() {
                if amount > 0 {
                    engine.grant_visits(actor, kind, amount);
                }
            }
        }

        for entry in &self.blocks {
            let location = LocationId(entry.location);
            let boundary = match &entry.boundary {
                Some(text) => text
                    .trim()
                    .parse::<Boundary>()
                    .map_err(|_| ScenarioError::InvalidBoundary(text.clone()))?,
                None => Boundary::default(),
            };
            let span = BlockSpan::new(Until::parse(&entry.until), boundary);
            match &entry.ability {
                Some(key) => {
                    let key = AbilityKey::parse(key)
                        .map_err(|source| ScenarioError::Ability { location, source })?;
                    engine.block_ability(location, key, span);
                }
                None => engine.block_location_visits(location, span),
            }
        }

        if let Some(phase) = &self.phase {
            let token = PhaseToken::parse(phase)?;
            engine.advance_phase(token);
        }

        debug!(
            target: "game_content::scenario",
            locations = self.locations.len(),
            actors = self.actors.len(),
            blocks = self.blocks.len(),
            "scenario applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{SessionConfig, SessionState};

    fn sample() -> ScenarioSeed {
        ScenarioSeed {
            phase: Some("night".into()),
            locations: vec![LocationSeed {
                id: 1,
                team: Some("RK".into()),
                abilities: vec![AbilitySeed {
                    key: "A1".into(),
                    category: "prot".into(),
                    uses: "1/night".into(),
                }],
                visits: VisitSeed {
                    ordinary: 2,
                    ..Default::default()
                },
            }],
            actors: vec![ActorSeed {
                id: 7,
                location: Some(1),
                income: Some(IncomeSeed { night: 1, day: 2 }),
                visits: VisitSeed {
                    stealth: 1,
                    ..Default::default()
                },
            }],
            blocks: vec![BlockSeed {
                location: 1,
                ability: None,
                until: "d2".into(),
                boundary: Some("beginning".into()),
            }],
        }
    }

    #[test]
    fn applies_every_section() {
        let config = SessionConfig::default();
        let mut state = SessionState::new();
        let mut engine = Engine::new(&mut state, &config);
        sample().apply(&mut engine).unwrap();

        let loc = LocationId(1);
        let actor = ActorId(7);
        assert_eq!(
            state.abilities.get(loc, AbilityKey(1)).map(|a| a.category),
            Some(Category::Protection)
        );
        assert_eq!(state.abilities.team(loc).map(Team::as_str), Some("rk"));
        assert_eq!(state.inventory.counts(loc).ordinary, 2);
        assert_eq!(state.whereabouts.locate(actor), Some(loc));
        // night refill replaced the ordinary counter, stealth untouched
        assert_eq!(state.inventory.counts(actor).ordinary, 1);
        assert_eq!(state.inventory.counts(actor).stealth, 1);
        assert!(state.blocks.is_location_visit_blocked(loc));
    }

    #[test]
    fn bad_category_names_the_location() {
        let mut scenario = sample();
        scenario.locations[0].abilities[0].category = "healing".into();

        let config = SessionConfig::default();
        let mut state = SessionState::new();
        let mut engine = Engine::new(&mut state, &config);
        let err = scenario.apply(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Ability {
                location: LocationId(1),
                source: AbilityError::UnknownCategory(_)
            }
        ));
    }
}
