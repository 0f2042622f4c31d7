//! Authoritative session state.
//!
//! [`SessionState`] is the full snapshot of one game session. Every piece of
//! it can be restored without replaying history. Runtime layers clone or
//! query it but mutate it exclusively through [`crate::engine::Engine`].
mod ids;
mod whereabouts;

pub use ids::{ActionId, ActorId, CorrelationToken, LocationId};
pub use whereabouts::Whereabouts;

use crate::ability::AbilityRegistry;
use crate::blocks::BlockRegistry;
use crate::inventory::TokenInventory;
use crate::knock::KnockWorkflow;
use crate::phase::PhaseClock;
use crate::preset::PresetBook;
use crate::queue::ResolutionQueue;

/// Canonical snapshot of a game session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    pub clock: PhaseClock,
    /// Ability assignments and team membership per location.
    pub abilities: AbilityRegistry,
    pub queue: ResolutionQueue,
    pub blocks: BlockRegistry,
    /// Visit counters for actors and locations, plus actor incomes.
    pub inventory: TokenInventory,
    pub whereabouts: Whereabouts,
    pub knocks: KnockWorkflow,
    /// Saved action templates per location.
    pub presets: PresetBook,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 digest of the bincode-encoded state.
    ///
    /// Two sessions fed the same commands in the same order have the same
    /// root, which makes it a cheap equality check across snapshots.
    #[cfg(feature = "serde")]
    pub fn state_root(&self) -> Result<[u8; 32], bincode::Error> {
        use sha2::{Digest, Sha256};

        let bytes = bincode::serialize(self)?;
        Ok(Sha256::digest(&bytes).into())
    }
}
