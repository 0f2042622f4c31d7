//! Knock workflow: moving an actor into another location.
//!
//! A plain knock opens a ticket and waits for someone at the target to open
//! or refuse. Knocks carrying stealth/forced modifiers skip the handshake and
//! move the actor at once.
//!
//! ```text
//! request ──(modifiers)──────────────> Executed
//!    │
//!    └──(plain)──> Requested ──open──> Opened
//!                      │       └─────> Aborted (no visit left)
//!                      └─────refuse──> Refused
//! ```

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::inventory::{TokenInventory, VisitKind};
use crate::phase::PhaseToken;
use crate::state::{ActorId, CorrelationToken, LocationId, Whereabouts};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnockError {
    #[error("{actor} lacks tokens for modifiers {missing:?}")]
    InsufficientTokens { actor: ActorId, missing: Modifiers },

    #[error("{actor} has no visits remaining")]
    NoVisitsRemaining { actor: ActorId },

    #[error("no pending knock {0}")]
    UnknownTicket(CorrelationToken),
}

impl crate::error::GameError for KnockError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        match self {
            Self::InsufficientTokens { .. } | Self::NoVisitsRemaining { .. } => {
                crate::error::ErrorSeverity::Recoverable
            }
            Self::UnknownTicket(_) => crate::error::ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientTokens { .. } => "KNOCK_INSUFFICIENT_TOKENS",
            Self::NoVisitsRemaining { .. } => "KNOCK_NO_VISITS",
            Self::UnknownTicket(_) => "KNOCK_UNKNOWN_TICKET",
        }
    }
}

bitflags! {
    /// Enchantments that change how a knock is carried out.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        /// Suppresses leave/arrive announcements.
        const STEALTH = 1 << 0;
        /// Enters without waiting for an answer.
        const FORCED  = 1 << 1;
    }
}

impl Modifiers {
    fn visit_kinds(self) -> impl Iterator<Item = (Modifiers, VisitKind)> {
        [
            (Modifiers::STEALTH, VisitKind::Stealth),
            (Modifiers::FORCED, VisitKind::Forced),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
    }
}

/// Inbound knock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnockRequest {
    pub actor: ActorId,
    pub origin: LocationId,
    pub target: LocationId,
    pub modifiers: Modifiers,
    /// Overseers knock for free.
    pub privileged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnockTicket {
    pub token: CorrelationToken,
    pub actor: ActorId,
    pub origin: LocationId,
    pub target: LocationId,
    pub modifiers: Modifiers,
    pub initiator_is_privileged: bool,
    /// Clock transition count when the ticket was opened.
    pub requested_at: u64,
}

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
pub enum KnockVerdict {
    Open,
    Refuse,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum KnockOutcome {
    /// Modifier knock, moved without a handshake.
    Executed,
    Opened,
    Refused,
    /// Ticket exceeded the configured lifetime.
    Expired,
    /// Opened, but the knocker had no visit left to spend.
    Aborted,
}

/// Relocation performed by a knock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movement {
    pub actor: ActorId,
    pub from: LocationId,
    pub to: LocationId,
    /// False when the knock was stealthy.
    pub announced: bool,
}

/// Terminal state of a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnockResolution {
    pub ticket: KnockTicket,
    pub outcome: KnockOutcome,
    pub movement: Option<Movement>,
}

/// What [`KnockWorkflow::request_knock`] produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KnockStart {
    /// Waiting for an open/refuse reply.
    Requested(KnockTicket),
    Executed(KnockResolution),
}

/// Clock position the workflow needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnockClock {
    pub token: PhaseToken,
    pub transitions: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnockWorkflow {
    tickets: BTreeMap<CorrelationToken, KnockTicket>,
    next_token: u64,
}

impl KnockWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_knock(
        &mut self,
        request: KnockRequest,
        clock: KnockClock,
        inventory: &mut TokenInventory,
        whereabouts: &mut Whereabouts,
    ) -> Result<KnockStart, KnockError> {
        if !request.modifiers.is_empty() {
            if !request.privileged {
                pay_modifiers(request.actor, request.modifiers, inventory)?;
            }
            let ticket = self.issue(request, clock.transitions);
            let movement = relocate(
                whereabouts,
                ticket,
                !request.modifiers.contains(Modifiers::STEALTH),
            );
            return Ok(KnockStart::Executed(KnockResolution {
                ticket,
                outcome: KnockOutcome::Executed,
                movement: Some(movement),
            }));
        }

        if !request.privileged {
            let has_visit = VisitKind::for_phase(clock.token)
                .is_some_and(|kind| inventory.has(request.actor, kind));
            if !has_visit {
                return Err(KnockError::NoVisitsRemaining {
                    actor: request.actor,
                });
            }
        }

        let ticket = self.issue(request, clock.transitions);
        self.tickets.insert(ticket.token, ticket);
        Ok(KnockStart::Requested(ticket))
    }

    /// Answers a pending ticket.
    ///
    /// Returns `None` when the token is unknown or the responder is not at
    /// the target; stale and stray replies are ignored.
    pub fn respond(
        &mut self,
        token: CorrelationToken,
        verdict: KnockVerdict,
        responder: ActorId,
        clock: KnockClock,
        inventory: &mut TokenInventory,
        whereabouts: &mut Whereabouts,
    ) -> Option<KnockResolution> {
        let ticket = *self.tickets.get(&token)?;
        if whereabouts.locate(responder) != Some(ticket.target) {
            return None;
        }
        self.tickets.remove(&token);

        let resolution = match verdict {
            KnockVerdict::Refuse => KnockResolution {
                ticket,
                outcome: KnockOutcome::Refused,
                movement: None,
            },
            KnockVerdict::Open => {
                let paid = ticket.initiator_is_privileged
                    || VisitKind::for_phase(clock.token)
                        .is_some_and(|kind| inventory.consume(ticket.actor, kind));
                if paid {
                    KnockResolution {
                        ticket,
                        outcome: KnockOutcome::Opened,
                        movement: Some(relocate(whereabouts, ticket, true)),
                    }
                } else {
                    KnockResolution {
                        ticket,
                        outcome: KnockOutcome::Aborted,
                        movement: None,
                    }
                }
            }
        };
        Some(resolution)
    }

    /// Administrative withdrawal of a pending ticket.
    pub fn cancel(&mut self, token: CorrelationToken) -> Result<KnockTicket, KnockError> {
        self.tickets
            .remove(&token)
            .ok_or(KnockError::UnknownTicket(token))
    }

    /// Drops tickets at least `ttl` transitions old.
    pub fn expire_stale(&mut self, transitions: u64, ttl: u32) -> Vec<KnockTicket> {
        let stale: Vec<CorrelationToken> = self
            .tickets
            .values()
            .filter(|ticket| transitions.saturating_sub(ticket.requested_at) >= u64::from(ttl))
            .map(|ticket| ticket.token)
            .collect();
        stale
            .into_iter()
            .filter_map(|token| self.tickets.remove(&token))
            .collect()
    }

    pub fn get(&self, token: CorrelationToken) -> Option<&KnockTicket> {
        self.tickets.get(&token)
    }

    pub fn pending(&self) -> impl Iterator<Item = &KnockTicket> {
        self.tickets.values()
    }

    fn issue(&mut self, request: KnockRequest, transitions: u64) -> KnockTicket {
        self.next_token += 1;
        KnockTicket {
            token: CorrelationToken(self.next_token),
            actor: request.actor,
            origin: request.origin,
            target: request.target,
            modifiers: request.modifiers,
            initiator_is_privileged: request.privileged,
            requested_at: transitions,
        }
    }
}

/// Spends one token per modifier, all or nothing.
///
/// A combined token stands in for the stealth+forced pair when the
/// individual tokens are not both available.
fn pay_modifiers(
    actor: ActorId,
    modifiers: Modifiers,
    inventory: &mut TokenInventory,
) -> Result<(), KnockError> {
    let mut spent = Vec::new();
    let mut missing = Modifiers::empty();
    for (flag, kind) in modifiers.visit_kinds() {
        if inventory.consume(actor, kind) {
            spent.push(kind);
        } else {
            missing |= flag;
        }
    }

    if missing.is_empty() {
        return Ok(());
    }
    for kind in spent {
        inventory.grant(actor, kind, 1);
    }

    let both = Modifiers::STEALTH | Modifiers::FORCED;
    if modifiers == both && inventory.consume(actor, VisitKind::Combined) {
        return Ok(());
    }
    Err(KnockError::InsufficientTokens { actor, missing })
}

fn relocate(whereabouts: &mut Whereabouts, ticket: KnockTicket, announced: bool) -> Movement {
    let from = whereabouts.place(ticket.actor, ticket.target).unwrap_or(ticket.origin);
    Movement {
        actor: ticket.actor,
        from,
        to: ticket.target,
        announced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ActorId = ActorId(1);
    const B: ActorId = ActorId(2);
    const LOC1: LocationId = LocationId(1);
    const LOC2: LocationId = LocationId(2);

    const NIGHT: KnockClock = KnockClock {
        token: PhaseToken::Night,
        transitions: 1,
    };

    struct Fixture {
        knocks: KnockWorkflow,
        inventory: TokenInventory,
        whereabouts: Whereabouts,
    }

    impl Fixture {
        fn new() -> Self {
            let mut whereabouts = Whereabouts::new();
            whereabouts.place(A, LOC1);
            whereabouts.place(B, LOC2);
            Self {
                knocks: KnockWorkflow::new(),
                inventory: TokenInventory::new(),
                whereabouts,
            }
        }

        fn knock(&mut self, modifiers: Modifiers) -> Result<KnockStart, KnockError> {
            let request = KnockRequest {
                actor: A,
                origin: LOC1,
                target: LOC2,
                modifiers,
                privileged: false,
            };
            self.knocks
                .request_knock(request, NIGHT, &mut self.inventory, &mut self.whereabouts)
        }

        fn reply(&mut self, token: CorrelationToken, verdict: KnockVerdict) -> Option<KnockResolution> {
            self.knocks.respond(
                token,
                verdict,
                B,
                NIGHT,
                &mut self.inventory,
                &mut self.whereabouts,
            )
        }
    }

    fn requested(start: KnockStart) -> KnockTicket {
        match start {
            KnockStart::Requested(ticket) => ticket,
            other => panic!("expected a pending ticket, got {other:?}"),
        }
    }

    #[test]
    fn refuse_then_open() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Ordinary, 1);

        let ticket = requested(fx.knock(Modifiers::empty()).unwrap());
        let refused = fx.reply(ticket.token, KnockVerdict::Refuse).unwrap();
        assert_eq!(refused.outcome, KnockOutcome::Refused);
        assert!(fx.knocks.get(ticket.token).is_none());
        assert_eq!(fx.inventory.counts(A).ordinary, 1);
        assert_eq!(fx.whereabouts.locate(A), Some(LOC1));

        let ticket = requested(fx.knock(Modifiers::empty()).unwrap());
        let opened = fx.reply(ticket.token, KnockVerdict::Open).unwrap();
        assert_eq!(opened.outcome, KnockOutcome::Opened);
        assert_eq!(fx.whereabouts.locate(A), Some(LOC2));
        assert_eq!(fx.inventory.counts(A).ordinary, 0);
    }

    #[test]
    fn plain_knock_needs_a_visit() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.knock(Modifiers::empty()),
            Err(KnockError::NoVisitsRemaining { actor: A })
        );
        assert_eq!(fx.knocks.pending().count(), 0);
    }

    #[test]
    fn knocks_outside_day_and_night_have_no_visit_to_spend() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Ordinary, 1);
        let request = KnockRequest {
            actor: A,
            origin: LOC1,
            target: LOC2,
            modifiers: Modifiers::empty(),
            privileged: false,
        };
        let pregame = KnockClock {
            token: PhaseToken::Pregame,
            transitions: 0,
        };
        let result =
            fx.knocks
                .request_knock(request, pregame, &mut fx.inventory, &mut fx.whereabouts);
        assert!(matches!(result, Err(KnockError::NoVisitsRemaining { .. })));
    }

    #[test]
    fn stale_and_stray_replies_are_ignored() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Ordinary, 1);
        let ticket = requested(fx.knock(Modifiers::empty()).unwrap());

        assert!(fx.reply(CorrelationToken(999), KnockVerdict::Open).is_none());

        // responder away from the target location
        fx.whereabouts.place(B, LocationId(9));
        assert!(fx.reply(ticket.token, KnockVerdict::Open).is_none());
        assert!(fx.knocks.get(ticket.token).is_some());

        fx.whereabouts.place(B, LOC2);
        assert!(fx.reply(ticket.token, KnockVerdict::Open).is_some());
        assert!(fx.reply(ticket.token, KnockVerdict::Open).is_none());
    }

    #[test]
    fn open_without_visit_aborts_and_discards_ticket() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Ordinary, 1);
        let ticket = requested(fx.knock(Modifiers::empty()).unwrap());
        fx.inventory.remove(A, VisitKind::Ordinary, 1);

        let resolution = fx.reply(ticket.token, KnockVerdict::Open).unwrap();
        assert_eq!(resolution.outcome, KnockOutcome::Aborted);
        assert_eq!(resolution.movement, None);
        assert_eq!(fx.whereabouts.locate(A), Some(LOC1));
        assert!(fx.knocks.get(ticket.token).is_none());
    }

    #[test]
    fn modifiers_are_all_or_nothing() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Stealth, 1);

        let err = fx.knock(Modifiers::STEALTH | Modifiers::FORCED).unwrap_err();
        assert_eq!(
            err,
            KnockError::InsufficientTokens {
                actor: A,
                missing: Modifiers::FORCED
            }
        );
        assert_eq!(fx.inventory.counts(A).stealth, 1);
        assert_eq!(fx.inventory.counts(A).forced, 0);
        assert_eq!(fx.whereabouts.locate(A), Some(LOC1));
    }

    #[test]
    fn combined_token_covers_both_modifiers() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Stealth, 1);
        fx.inventory.grant(A, VisitKind::Combined, 1);

        let start = fx.knock(Modifiers::STEALTH | Modifiers::FORCED).unwrap();
        assert!(matches!(start, KnockStart::Executed(_)));
        assert_eq!(fx.inventory.counts(A).stealth, 1);
        assert_eq!(fx.inventory.counts(A).combined, 0);
    }

    #[test]
    fn stealth_knock_moves_silently() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Stealth, 1);

        let KnockStart::Executed(resolution) = fx.knock(Modifiers::STEALTH).unwrap() else {
            panic!("stealth knock should execute immediately");
        };
        let movement = resolution.movement.unwrap();
        assert!(!movement.announced);
        assert_eq!((movement.from, movement.to), (LOC1, LOC2));
        assert_eq!(fx.knocks.pending().count(), 0);

        fx.inventory.grant(A, VisitKind::Forced, 1);
        let KnockStart::Executed(loud) = fx.knock(Modifiers::FORCED).unwrap() else {
            panic!("forced knock should execute immediately");
        };
        assert!(loud.movement.unwrap().announced);
    }

    #[test]
    fn privileged_knocks_are_free() {
        let mut fx = Fixture::new();
        let request = KnockRequest {
            actor: A,
            origin: LOC1,
            target: LOC2,
            modifiers: Modifiers::empty(),
            privileged: true,
        };
        let start = fx
            .knocks
            .request_knock(request, NIGHT, &mut fx.inventory, &mut fx.whereabouts)
            .unwrap();
        let ticket = requested(start);
        let opened = fx.reply(ticket.token, KnockVerdict::Open).unwrap();
        assert_eq!(opened.outcome, KnockOutcome::Opened);

        let forced = KnockRequest {
            modifiers: Modifiers::FORCED,
            ..request
        };
        assert!(
            fx.knocks
                .request_knock(forced, NIGHT, &mut fx.inventory, &mut fx.whereabouts)
                .is_ok()
        );
    }

    #[test]
    fn expire_stale_respects_ttl() {
        let mut fx = Fixture::new();
        fx.inventory.grant(A, VisitKind::Ordinary, 1);
        let ticket = requested(fx.knock(Modifiers::empty()).unwrap());

        assert!(fx.knocks.expire_stale(2, 2).is_empty());
        assert_eq!(fx.knocks.expire_stale(3, 2), vec![ticket]);
        assert_eq!(
            fx.knocks.cancel(ticket.token),
            Err(KnockError::UnknownTicket(ticket.token))
        );
    }
}
