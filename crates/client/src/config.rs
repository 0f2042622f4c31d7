//! Driver configuration read from the environment.
use std::env;
use std::path::PathBuf;

/// Settings for one scripted session run.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub session_id: String,
    /// Seed applied when the session has no stored snapshot.
    pub scenario: Option<PathBuf>,
    /// TOML session policy; replaces the policy built from `MANOR_TICKET_TTL`.
    pub session_config: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    /// Print every engine event as a JSON line.
    pub echo_events: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            session_id: "default".to_string(),
            scenario: None,
            session_config: None,
            log_dir: None,
            echo_events: true,
        }
    }
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `MANOR_SESSION` - Session identifier (default: `default`)
    /// - `MANOR_SCENARIO` - Scenario seed file, `.toml` or `.ron`
    /// - `MANOR_CONFIG` - Session policy TOML file
    /// - `MANOR_LOG_DIR` - Log root (default: platform cache dir)
    /// - `MANOR_ECHO_EVENTS` - Print events to stdout (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(session) = env::var("MANOR_SESSION")
            && !session.trim().is_empty()
        {
            config.session_id = session.trim().to_string();
        }

        config.scenario = env::var("MANOR_SCENARIO").ok().map(PathBuf::from);
        config.session_config = env::var("MANOR_CONFIG").ok().map(PathBuf::from);
        config.log_dir = env::var("MANOR_LOG_DIR").ok().map(PathBuf::from);

        if let Some(echo) = read_env::<bool>("MANOR_ECHO_EVENTS") {
            config.echo_events = echo;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
