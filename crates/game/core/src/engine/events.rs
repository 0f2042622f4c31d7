use crate::blocks::BlockKey;
use crate::inventory::VisitKind;
use crate::knock::{KnockResolution, KnockTicket};
use crate::phase::{PhaseToken, PhaseTransition};
use crate::queue::{PendingAction, SkipReason};
use crate::state::ActorId;

/// Outbound notification raised by the engine for external delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineEvent {
    PhaseAdvanced {
        transition: PhaseTransition,
    },
    /// Administrative reset; epochs before and after are not comparable.
    PhaseCounterReset {
        transition: PhaseTransition,
    },
    VisitsRefilled {
        token: PhaseToken,
        actors: Vec<ActorId>,
    },
    BlockExpired {
        key: BlockKey,
    },
    ActionApplied {
        action: PendingAction,
        consumed: Option<VisitKind>,
    },
    ActionSkipped {
        action: PendingAction,
        reason: SkipReason,
    },
    KnockRequested {
        ticket: KnockTicket,
    },
    KnockResolved {
        resolution: KnockResolution,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhaseAdvanced { .. } => "phase_advanced",
            Self::PhaseCounterReset { .. } => "phase_counter_reset",
            Self::VisitsRefilled { .. } => "visits_refilled",
            Self::BlockExpired { .. } => "block_expired",
            Self::ActionApplied { .. } => "action_applied",
            Self::ActionSkipped { .. } => "action_skipped",
            Self::KnockRequested { .. } => "knock_requested",
            Self::KnockResolved { .. } => "knock_resolved",
        }
    }
}
