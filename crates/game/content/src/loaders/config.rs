//! Session configuration loader.

use std::path::Path;

use game_core::SessionConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for session configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`SessionConfig`] from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<SessionConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SessionConfig> {
        let config: SessionConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = ConfigLoader::parse("ticket_ttl_phases = 2\n").unwrap();
        assert_eq!(config.ticket_ttl_phases, Some(2));
        assert_eq!(
            config.max_pending_actions,
            SessionConfig::DEFAULT_MAX_PENDING_ACTIONS
        );
    }

    #[test]
    fn empty_file_is_the_default_config() {
        assert_eq!(ConfigLoader::parse("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(ConfigLoader::parse("max_pending_actions = \"lots\"").is_err());
    }
}
