//! Data-driven session content and loaders.
//!
//! This crate houses seed data for game sessions and the loaders that read
//! it from disk:
//! - Session policy (data-driven via TOML)
//! - Scenario seeds: locations, abilities, teams, actors, incomes and
//!   starting blocks (data-driven via TOML or RON)
//!
//! A scenario is applied through [`game_core::Engine`], so seeding follows
//! the same validation as live commands.

pub mod scenario;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use scenario::{
    AbilitySeed, ActorSeed, BlockSeed, IncomeSeed, LocationSeed, ScenarioError, ScenarioSeed,
    VisitSeed,
};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ScenarioLoader};
