/// Tunable policy for one game session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Pending knock tickets older than this many phase transitions are
    /// expired on the next advance. `None` keeps them until answered.
    pub ticket_ttl_phases: Option<u32>,

    /// Upper bound on queued actions; submissions past it are rejected.
    pub max_pending_actions: usize,
}

impl SessionConfig {
    pub const DEFAULT_MAX_PENDING_ACTIONS: usize = 1024;

    pub fn new() -> Self {
        Self {
            ticket_ttl_phases: None,
            max_pending_actions: Self::DEFAULT_MAX_PENDING_ACTIONS,
        }
    }

    pub fn with_ticket_ttl(mut self, phases: u32) -> Self {
        self.ticket_ttl_phases = Some(phases);
        self
    }

    pub fn with_max_pending_actions(mut self, max: usize) -> Self {
        self.max_pending_actions = max;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
