//! Scenario seed loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::scenario::ScenarioSeed;

/// Loader for scenario seeds from TOML or RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario; `.ron` files are read as RON, everything else as TOML.
    pub fn load(path: &Path) -> LoadResult<ScenarioSeed> {
        let content = read_file(path)?;
        let is_ron = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"));

        if is_ron {
            Self::parse_ron(&content)
        } else {
            Self::parse_toml(&content)
        }
    }

    pub fn parse_toml(content: &str) -> LoadResult<ScenarioSeed> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse scenario TOML: {}", e))
    }

    pub fn parse_ron(content: &str) -> LoadResult<ScenarioSeed> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))
    }
}
