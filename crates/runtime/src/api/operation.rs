//! Boundary commands accepted by a session worker.
//!
//! An [`Operation`] is the owned form of one [`Engine`] call, so it can be
//! queued across the worker channel; [`Outcome`] carries the call's return
//! value back.

use game_core::{
    AbilityAssignment, AbilityKey, ActionId, ActorId, BlockSpan, Category, CorrelationToken,
    Engine, EngineError, Holder, Income, KnockRequest, KnockResolution, KnockStart, KnockTicket,
    KnockVerdict, LocationId, PendingAction, PhaseToken, PhaseTransition, Preset, PresetPage,
    ResolutionReport, Team, VisitKind,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    AssignAbility {
        location: LocationId,
        key: AbilityKey,
        category: Category,
        uses: String,
    },
    UpdateAbilityCategory {
        location: LocationId,
        key: AbilityKey,
        category: Category,
    },
    RemoveAbility {
        location: LocationId,
        key: AbilityKey,
    },
    AssignTeam {
        location: LocationId,
        team: Team,
    },
    SubmitAction {
        actor: ActorId,
        location: LocationId,
        key: AbilityKey,
        description: String,
    },
    CancelAction {
        id: ActionId,
    },
    ResolveCycle,
    AdvancePhase {
        target: PhaseToken,
    },
    NextPhase,
    ResetPhaseCounter,
    GrantVisits {
        holder: Holder,
        kind: VisitKind,
        amount: u32,
    },
    RemoveVisits {
        holder: Holder,
        kind: VisitKind,
        amount: u32,
    },
    SetIncome {
        actor: ActorId,
        income: Income,
    },
    BlockAbility {
        location: LocationId,
        key: AbilityKey,
        span: BlockSpan,
    },
    UnblockAbility {
        location: LocationId,
        key: AbilityKey,
    },
    BlockLocationVisits {
        location: LocationId,
        span: BlockSpan,
    },
    UnblockLocationVisits {
        location: LocationId,
    },
    PlaceActor {
        actor: ActorId,
        location: LocationId,
    },
    RemoveActor {
        actor: ActorId,
    },
    AddPreset {
        location: LocationId,
        text: String,
    },
    /// `page` is 1-based.
    ListPresets {
        location: LocationId,
        page: usize,
    },
    /// Every location's presets, for administrators.
    AllPresets,
    MovePreset {
        location: LocationId,
        from: usize,
        to: usize,
    },
    RemovePreset {
        location: LocationId,
        position: usize,
    },
    RequestKnock(KnockRequest),
    RespondKnock {
        token: CorrelationToken,
        verdict: KnockVerdict,
        responder: ActorId,
    },
    CancelKnock {
        token: CorrelationToken,
    },
}

/// Return value of an applied [`Operation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Removed(AbilityAssignment),
    Submitted(ActionId),
    Cancelled(PendingAction),
    Resolved(ResolutionReport),
    Phase(PhaseTransition),
    /// Counter value after a grant or removal.
    Visits(u32),
    /// Whether an unblock found something to lift.
    Unblocked(bool),
    /// Previous location of a placed or removed actor.
    Placed(Option<LocationId>),
    /// 1-based position of a saved preset.
    PresetAdded(usize),
    Presets(PresetPage),
    PresetBook(Vec<(LocationId, Vec<Preset>)>),
    PresetRemoved(Preset),
    Knock(KnockStart),
    /// `None` when the reply was ignored.
    KnockReply(Option<KnockResolution>),
    KnockCancelled(KnockTicket),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssignAbility { .. } => "assign_ability",
            Self::UpdateAbilityCategory { .. } => "update_ability_category",
            Self::RemoveAbility { .. } => "remove_ability",
            Self::AssignTeam { .. } => "assign_team",
            Self::SubmitAction { .. } => "submit_action",
            Self::CancelAction { .. } => "cancel_action",
            Self::ResolveCycle => "resolve_cycle",
            Self::AdvancePhase { .. } => "advance_phase",
            Self::NextPhase => "next_phase",
            Self::ResetPhaseCounter => "reset_phase_counter",
            Self::GrantVisits { .. } => "grant_visits",
            Self::RemoveVisits { .. } => "remove_visits",
            Self::SetIncome { .. } => "set_income",
            Self::BlockAbility { .. } => "block_ability",
            Self::UnblockAbility { .. } => "unblock_ability",
            Self::BlockLocationVisits { .. } => "block_location_visits",
            Self::UnblockLocationVisits { .. } => "unblock_location_visits",
            Self::PlaceActor { .. } => "place_actor",
            Self::RemoveActor { .. } => "remove_actor",
            Self::AddPreset { .. } => "add_preset",
            Self::ListPresets { .. } => "list_presets",
            Self::AllPresets => "all_presets",
            Self::MovePreset { .. } => "move_preset",
            Self::RemovePreset { .. } => "remove_preset",
            Self::RequestKnock(_) => "request_knock",
            Self::RespondKnock { .. } => "respond_knock",
            Self::CancelKnock { .. } => "cancel_knock",
        }
    }

    /// Runs the operation against an engine.
    pub fn apply(self, engine: &mut Engine<'_>) -> Result<Outcome, EngineError> {
        let outcome = match self {
            Self::AssignAbility {
                location,
                key,
                category,
                uses,
            } => {
                engine.assign_ability(location, key, category, uses)?;
                Outcome::Done
            }
            Self::UpdateAbilityCategory {
                location,
                key,
                category,
            } => {
                engine.update_ability_category(location, key, category)?;
                Outcome::Done
            }
            Self::RemoveAbility { location, key } => {
                Outcome::Removed(engine.remove_ability(location, key)?)
            }
            Self::AssignTeam { location, team } => {
                engine.assign_team(location, team);
                Outcome::Done
            }
            Self::SubmitAction {
                actor,
                location,
                key,
                description,
            } => Outcome::Submitted(engine.submit_action(actor, location, key, description)?),
            Self::CancelAction { id } => Outcome::Cancelled(engine.cancel_action(id)?),
            Self::ResolveCycle => Outcome::Resolved(engine.resolve_cycle()),
            Self::AdvancePhase { target } => Outcome::Phase(engine.advance_phase(target)),
            Self::NextPhase => Outcome::Phase(engine.next_phase()),
            Self::ResetPhaseCounter => Outcome::Phase(engine.reset_phase_counter()),
            Self::GrantVisits {
                holder,
                kind,
                amount,
            } => Outcome::Visits(engine.grant_visits(holder, kind, amount)),
            Self::RemoveVisits {
                holder,
                kind,
                amount,
            } => Outcome::Visits(engine.remove_visits(holder, kind, amount)),
            Self::SetIncome { actor, income } => {
                engine.set_income(actor, income);
                Outcome::Done
            }
            Self::BlockAbility {
                location,
                key,
                span,
            } => {
                engine.block_ability(location, key, span);
                Outcome::Done
            }
            Self::UnblockAbility { location, key } => {
                Outcome::Unblocked(engine.unblock_ability(location, key))
            }
            Self::BlockLocationVisits { location, span } => {
                engine.block_location_visits(location, span);
                Outcome::Done
            }
            Self::UnblockLocationVisits { location } => {
                Outcome::Unblocked(engine.unblock_location_visits(location))
            }
            Self::PlaceActor { actor, location } => {
                Outcome::Placed(engine.place_actor(actor, location))
            }
            Self::RemoveActor { actor } => Outcome::Placed(engine.remove_actor(actor)),
            Self::AddPreset { location, text } => {
                Outcome::PresetAdded(engine.add_preset(location, text))
            }
            Self::ListPresets { location, page } => {
                Outcome::Presets(engine.preset_page(location, page)?)
            }
            Self::AllPresets => Outcome::PresetBook(
                engine
                    .state()
                    .presets
                    .iter()
                    .map(|(location, presets)| (location, presets.to_vec()))
                    .collect(),
            ),
            Self::MovePreset { location, from, to } => {
                engine.move_preset(location, from, to)?;
                Outcome::Done
            }
            Self::RemovePreset { location, position } => {
                Outcome::PresetRemoved(engine.remove_preset(location, position)?)
            }
            Self::RequestKnock(request) => Outcome::Knock(engine.request_knock(request)?),
            Self::RespondKnock {
                token,
                verdict,
                responder,
            } => Outcome::KnockReply(engine.respond_knock(token, verdict, responder)?),
            Self::CancelKnock { token } => Outcome::KnockCancelled(engine.cancel_knock(token)?),
        };
        Ok(outcome)
    }
}
