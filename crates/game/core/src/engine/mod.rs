//! Session command facade.
//!
//! The [`Engine`] is the only writer of [`SessionState`]. It applies one
//! boundary command at a time, keeps the components consistent with each
//! other (clock advance triggers sweep, refill and ticket expiry) and
//! collects the [`EngineEvent`]s each command raises.

mod errors;
mod events;

pub use errors::EngineError;
pub use events::EngineEvent;

use tracing::{debug, info};

use crate::ability::{AbilityAssignment, AbilityError, AbilityKey, Category, Team};
use crate::blocks::BlockSpan;
use crate::config::SessionConfig;
use crate::inventory::{Holder, Income, VisitKind};
use crate::knock::{
    KnockClock, KnockError, KnockOutcome, KnockRequest, KnockResolution, KnockStart, KnockTicket,
    KnockVerdict,
};
use crate::phase::{PhaseToken, PhaseTransition};
use crate::preset::{Preset, PresetAbility, PresetPage};
use crate::queue::{NewAction, PendingAction, QueueError, ResolutionReport};
use crate::state::{ActionId, ActorId, CorrelationToken, LocationId, SessionState};

/// Applies commands to one session and records the events they raise.
pub struct Engine<'a> {
    state: &'a mut SessionState,
    config: &'a SessionConfig,
    events: Vec<EngineEvent>,
}

impl<'a> Engine<'a> {
    pub fn new(state: &'a mut SessionState, config: &'a SessionConfig) -> Self {
        Self {
            state,
            config,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        self.state
    }

    /// Events raised so far, in order.
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<EngineEvent> {
        self.events
    }

    // ===== abilities =====

    pub fn assign_ability(
        &mut self,
        location: LocationId,
        key: AbilityKey,
        category: Category,
        uses: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.state
            .abilities
            .assign(location, key, category, uses)?;
        debug!(target: "game_core::engine", %location, %key, %category, "ability assigned");
        Ok(())
    }

    pub fn update_ability_category(
        &mut self,
        location: LocationId,
        key: AbilityKey,
        category: Category,
    ) -> Result<(), EngineError> {
        self.state
            .abilities
            .update_category(location, key, category)?;
        Ok(())
    }

    pub fn remove_ability(
        &mut self,
        location: LocationId,
        key: AbilityKey,
    ) -> Result<AbilityAssignment, EngineError> {
        Ok(self.state.abilities.remove(location, key)?)
    }

    pub fn assign_team(&mut self, location: LocationId, team: Team) {
        self.state.abilities.assign_team(location, team);
    }

    // ===== queue =====

    /// Queues a use of `key` by `actor`, capturing the ability's category
    /// and the location's team as they are now.
    pub fn submit_action(
        &mut self,
        actor: ActorId,
        location: LocationId,
        key: AbilityKey,
        description: impl Into<String>,
    ) -> Result<ActionId, EngineError> {
        let limit = self.config.max_pending_actions;
        if self.state.queue.len() >= limit {
            return Err(QueueError::QueueFull { limit }.into());
        }

        let category = self
            .state
            .abilities
            .get(location, key)
            .map(|assignment| assignment.category)
            .ok_or(AbilityError::AbilityNotFound { location, key })?;
        let team = self.state.abilities.team(location).cloned();

        let action = self.state.queue.submit(NewAction {
            actor,
            location,
            ability: key,
            category,
            team,
            description: description.into(),
        });
        debug!(
            target: "game_core::engine",
            id = %action.id,
            %actor,
            %location,
            %key,
            "action submitted"
        );
        Ok(action.id)
    }

    pub fn cancel_action(&mut self, id: ActionId) -> Result<PendingAction, EngineError> {
        Ok(self.state.queue.cancel(id)?)
    }

    /// Applies every pending action that is not blocked.
    pub fn resolve_cycle(&mut self) -> ResolutionReport {
        let state = &mut *self.state;
        let report = state
            .queue
            .resolve_cycle(&state.blocks, &mut state.inventory);

        for applied in &report.applied {
            debug!(
                target: "game_core::engine",
                id = %applied.action.id,
                consumed = ?applied.consumed,
                "action applied"
            );
            self.events.push(EngineEvent::ActionApplied {
                action: applied.action.clone(),
                consumed: applied.consumed,
            });
        }
        for skipped in &report.skipped {
            debug!(
                target: "game_core::engine",
                id = %skipped.action.id,
                reason = %skipped.reason,
                "action skipped"
            );
            self.events.push(EngineEvent::ActionSkipped {
                action: skipped.action.clone(),
                reason: skipped.reason,
            });
        }

        info!(
            target: "game_core::engine",
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "resolve cycle complete"
        );
        report
    }

    // ===== presets =====

    /// Saves a preset for `location` and returns its 1-based position.
    ///
    /// When the first word of `text` is an ability the location owns, the
    /// preset records that ability with its category and the location's team.
    pub fn add_preset(&mut self, location: LocationId, text: impl Into<String>) -> usize {
        let text = text.into();
        let ability = text
            .split_whitespace()
            .next()
            .and_then(|word| AbilityKey::parse(word).ok())
            .and_then(|key| self.state.abilities.get(location, key))
            .map(|assignment| PresetAbility {
                key: assignment.key,
                category: assignment.category,
                team: self.state.abilities.team(location).cloned(),
            });
        let position = self.state.presets.add(location, text, ability);
        debug!(target: "game_core::engine", %location, position, "preset added");
        position
    }

    pub fn preset_page(
        &self,
        location: LocationId,
        page: usize,
    ) -> Result<PresetPage, EngineError> {
        Ok(self.state.presets.page(location, page)?)
    }

    pub fn move_preset(
        &mut self,
        location: LocationId,
        from: usize,
        to: usize,
    ) -> Result<(), EngineError> {
        self.state.presets.move_preset(location, from, to)?;
        Ok(())
    }

    pub fn remove_preset(
        &mut self,
        location: LocationId,
        position: usize,
    ) -> Result<Preset, EngineError> {
        Ok(self.state.presets.remove(location, position)?)
    }

    // ===== phase clock =====

    /// Moves the clock to `target`, then sweeps blocks, refills visits and
    /// expires stale knock tickets.
    pub fn advance_phase(&mut self, target: PhaseToken) -> PhaseTransition {
        let transition = self.state.clock.advance(target);
        info!(
            target: "game_core::engine",
            from = %transition.previous,
            to = %transition.current,
            "phase advanced"
        );
        self.events.push(EngineEvent::PhaseAdvanced { transition });

        self.sweep_blocks();

        let actors = self.state.inventory.refill_for_phase(target);
        if !actors.is_empty() {
            self.events.push(EngineEvent::VisitsRefilled {
                token: target,
                actors,
            });
        }

        if let Some(ttl) = self.config.ticket_ttl_phases {
            let now = self.state.clock.transitions();
            for ticket in self.state.knocks.expire_stale(now, ttl) {
                debug!(target: "game_core::engine", token = %ticket.token, "knock ticket expired");
                self.events.push(EngineEvent::KnockResolved {
                    resolution: KnockResolution {
                        ticket,
                        outcome: KnockOutcome::Expired,
                        movement: None,
                    },
                });
            }
        }

        transition
    }

    /// Parses `text` as a phase token and advances to it.
    pub fn advance_phase_named(&mut self, text: &str) -> Result<PhaseTransition, EngineError> {
        let target = PhaseToken::parse(text)?;
        Ok(self.advance_phase(target))
    }

    /// Advances to the next token in the administrative cycle.
    pub fn next_phase(&mut self) -> PhaseTransition {
        let target = self.state.clock.token().successor();
        self.advance_phase(target)
    }

    /// Sets the cycle counter back to 1.
    ///
    /// Epochs taken before the reset must not be compared with later ones.
    pub fn reset_phase_counter(&mut self) -> PhaseTransition {
        let transition = self.state.clock.reset_cycle();
        info!(
            target: "game_core::engine",
            from = %transition.previous,
            to = %transition.current,
            "phase counter reset"
        );
        self.events
            .push(EngineEvent::PhaseCounterReset { transition });
        self.sweep_blocks();
        transition
    }

    fn sweep_blocks(&mut self) {
        let reading = self.state.clock.reading();
        for key in self.state.blocks.sweep(reading) {
            debug!(target: "game_core::engine", block = %key, "block expired");
            self.events.push(EngineEvent::BlockExpired { key });
        }
    }

    // ===== inventory =====

    pub fn grant_visits(&mut self, holder: impl Into<Holder>, kind: VisitKind, amount: u32) -> u32 {
        self.state
            .inventory
            .grant(holder, kind, i64::from(amount))
    }

    /// Floors at zero.
    pub fn remove_visits(&mut self, holder: impl Into<Holder>, kind: VisitKind, amount: u32) -> u32 {
        self.state.inventory.remove(holder, kind, amount)
    }

    pub fn set_income(&mut self, actor: ActorId, income: Income) {
        self.state.inventory.set_income(actor, income);
    }

    // ===== blocks =====

    pub fn block_ability(&mut self, location: LocationId, key: AbilityKey, span: BlockSpan) {
        debug!(target: "game_core::engine", %location, %key, until = %span.until, "ability blocked");
        self.state.blocks.block_ability(location, key, span);
    }

    /// Returns whether a block was removed.
    pub fn unblock_ability(&mut self, location: LocationId, key: AbilityKey) -> bool {
        self.state.blocks.unblock_ability(location, key).is_some()
    }

    pub fn block_location_visits(&mut self, location: LocationId, span: BlockSpan) {
        debug!(target: "game_core::engine", %location, until = %span.until, "visits blocked");
        self.state.blocks.block_location_visits(location, span);
    }

    pub fn unblock_location_visits(&mut self, location: LocationId) -> bool {
        self.state.blocks.unblock_location_visits(location).is_some()
    }

    // ===== actors and knocks =====

    /// Administrative placement, returns the previous location.
    pub fn place_actor(&mut self, actor: ActorId, location: LocationId) -> Option<LocationId> {
        self.state.whereabouts.place(actor, location)
    }

    /// Clears an actor's location, returning where they were.
    ///
    /// A removed actor cannot answer knocks until placed again.
    pub fn remove_actor(&mut self, actor: ActorId) -> Option<LocationId> {
        self.state.whereabouts.remove(actor)
    }

    pub fn request_knock(&mut self, request: KnockRequest) -> Result<KnockStart, EngineError> {
        let clock = self.knock_clock();
        let state = &mut *self.state;
        let start = state.knocks.request_knock(
            request,
            clock,
            &mut state.inventory,
            &mut state.whereabouts,
        )?;

        match start {
            KnockStart::Requested(ticket) => {
                debug!(target: "game_core::engine", token = %ticket.token, actor = %ticket.actor, "knock requested");
                self.events.push(EngineEvent::KnockRequested { ticket });
            }
            KnockStart::Executed(resolution) => {
                debug!(
                    target: "game_core::engine",
                    actor = %resolution.ticket.actor,
                    modifiers = ?resolution.ticket.modifiers,
                    "knock executed"
                );
                self.events
                    .push(EngineEvent::KnockResolved { resolution });
            }
        }
        Ok(start)
    }

    /// Answers a pending knock.
    ///
    /// Unknown tokens and replies from outside the target are ignored
    /// (`Ok(None)`). Opening a knock whose actor has run out of visits
    /// discards the ticket and fails with `NoVisitsRemaining`.
    pub fn respond_knock(
        &mut self,
        token: CorrelationToken,
        verdict: KnockVerdict,
        responder: ActorId,
    ) -> Result<Option<KnockResolution>, EngineError> {
        let clock = self.knock_clock();
        let state = &mut *self.state;
        let Some(resolution) = state.knocks.respond(
            token,
            verdict,
            responder,
            clock,
            &mut state.inventory,
            &mut state.whereabouts,
        ) else {
            debug!(target: "game_core::engine", %token, %responder, "ignoring knock reply");
            return Ok(None);
        };

        debug!(
            target: "game_core::engine",
            %token,
            outcome = %resolution.outcome,
            "knock resolved"
        );
        self.events
            .push(EngineEvent::KnockResolved { resolution });

        if resolution.outcome == KnockOutcome::Aborted {
            return Err(KnockError::NoVisitsRemaining {
                actor: resolution.ticket.actor,
            }
            .into());
        }
        Ok(Some(resolution))
    }

    pub fn cancel_knock(&mut self, token: CorrelationToken) -> Result<KnockTicket, EngineError> {
        Ok(self.state.knocks.cancel(token)?)
    }

    fn knock_clock(&self) -> KnockClock {
        KnockClock {
            token: self.state.clock.token(),
            transitions: self.state.clock.transitions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockKey;
    use crate::phase::{Boundary, PhaseReading, Until};
    use crate::preset::PresetError;

    const LOC: LocationId = LocationId(1);
    const ACTOR: ActorId = ActorId(1);

    fn seeded() -> SessionState {
        let mut state = SessionState::new();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        engine
            .assign_ability(LOC, AbilityKey(1), Category::Lethal, "1")
            .unwrap();
        engine.assign_team(LOC, Team::new("Dark"));
        state
    }

    #[test]
    fn submit_captures_category_and_team() {
        let mut state = seeded();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        let id = engine
            .submit_action(ACTOR, LOC, AbilityKey(1), "kill")
            .unwrap();

        engine
            .update_ability_category(LOC, AbilityKey(1), Category::Other)
            .unwrap();
        let queued = engine.state().queue.get(id).unwrap();
        assert_eq!(queued.category, Category::Lethal);
        assert_eq!(queued.team, Some(Team::new("dark")));
    }

    #[test]
    fn submit_unknown_ability_is_rejected() {
        let mut state = seeded();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        let err = engine
            .submit_action(ACTOR, LOC, AbilityKey(7), "")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Ability(AbilityError::AbilityNotFound { .. })
        ));
        assert!(engine.state().queue.is_empty());
    }

    #[test]
    fn queue_cap_is_enforced() {
        let mut state = seeded();
        let config = SessionConfig::default().with_max_pending_actions(1);
        let mut engine = Engine::new(&mut state, &config);
        engine.submit_action(ACTOR, LOC, AbilityKey(1), "").unwrap();
        assert_eq!(
            engine.submit_action(ACTOR, LOC, AbilityKey(1), ""),
            Err(EngineError::Queue(QueueError::QueueFull { limit: 1 }))
        );
    }

    #[test]
    fn advance_sweeps_then_refills() {
        let mut state = SessionState::new();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        engine.set_income(ACTOR, Income::new(2, 1));
        engine.block_ability(
            LOC,
            AbilityKey(1),
            BlockSpan::new(Until::night(1), Boundary::Beginning),
        );

        engine.advance_phase(PhaseToken::Night);
        let events = engine.into_events();
        let names: Vec<_> = events.iter().map(EngineEvent::name).collect();
        assert_eq!(
            names,
            vec!["phase_advanced", "block_expired", "visits_refilled"]
        );
        assert!(events.contains(&EngineEvent::BlockExpired {
            key: BlockKey::Ability {
                location: LOC,
                ability: AbilityKey(1)
            }
        }));
        assert_eq!(state.inventory.counts(ACTOR).ordinary, 2);
    }

    #[test]
    fn invalid_phase_name_leaves_clock_untouched() {
        let mut state = SessionState::new();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        assert!(engine.advance_phase_named("dusk").is_err());
        assert!(engine.events().is_empty());
        assert_eq!(state.clock.reading(), PhaseReading::PREGAME);
    }

    #[test]
    fn preset_captures_owned_ability_only() {
        let mut state = seeded();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);

        assert_eq!(engine.add_preset(LOC, "a1 on the cellar"), 1);
        assert_eq!(engine.add_preset(LOC, "A9 is not mine"), 2);
        assert_eq!(engine.add_preset(LOC, "just a note"), 3);

        // later edits do not touch the saved template
        engine
            .update_ability_category(LOC, AbilityKey(1), Category::Other)
            .unwrap();

        let page = engine.preset_page(LOC, 1).unwrap();
        assert_eq!(
            page.entries[0].ability,
            Some(PresetAbility {
                key: AbilityKey(1),
                category: Category::Lethal,
                team: Some(Team::new("dark")),
            })
        );
        assert_eq!(page.entries[1].ability, None);
        assert_eq!(page.entries[2].ability, None);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn preset_move_and_remove_report_range_errors() {
        let mut state = SessionState::new();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        engine.add_preset(LOC, "first");
        engine.add_preset(LOC, "second");

        engine.move_preset(LOC, 2, 1).unwrap();
        assert_eq!(engine.remove_preset(LOC, 1).unwrap().text, "second");
        assert!(matches!(
            engine.move_preset(LOC, 5, 1),
            Err(EngineError::Preset(PresetError::OutOfRange { position: 5, .. }))
        ));
        assert_eq!(
            engine.preset_page(LocationId(8), 1),
            Err(EngineError::Preset(PresetError::NoPresets(LocationId(8))))
        );
    }

    #[test]
    fn removed_actor_cannot_answer_knocks() {
        let mut state = SessionState::new();
        let config = SessionConfig::default();
        let mut engine = Engine::new(&mut state, &config);
        let target = LocationId(2);
        let host = ActorId(2);
        engine.place_actor(host, target);
        engine.advance_phase(PhaseToken::Day);
        engine.grant_visits(ACTOR, VisitKind::Ordinary, 1);

        let KnockStart::Requested(ticket) = engine
            .request_knock(KnockRequest {
                actor: ACTOR,
                origin: LOC,
                target,
                modifiers: Default::default(),
                privileged: false,
            })
            .unwrap()
        else {
            panic!("expected a pending ticket");
        };

        assert_eq!(engine.remove_actor(host), Some(target));
        assert_eq!(engine.remove_actor(host), None);
        assert_eq!(
            engine.respond_knock(ticket.token, KnockVerdict::Open, host),
            Ok(None)
        );
        assert!(engine.state().knocks.get(ticket.token).is_some());
    }

    #[test]
    fn stale_tickets_expire_with_ttl() {
        let mut state = SessionState::new();
        let config = SessionConfig::default().with_ticket_ttl(1);
        let mut engine = Engine::new(&mut state, &config);
        engine.advance_phase(PhaseToken::Night);
        engine.grant_visits(ACTOR, VisitKind::Ordinary, 1);
        let start = engine
            .request_knock(KnockRequest {
                actor: ACTOR,
                origin: LOC,
                target: LocationId(2),
                modifiers: Default::default(),
                privileged: false,
            })
            .unwrap();
        assert!(matches!(start, KnockStart::Requested(_)));

        engine.advance_phase(PhaseToken::Day);
        let expired = engine.events().iter().any(|event| {
            matches!(
                event,
                EngineEvent::KnockResolved { resolution } if resolution.outcome == KnockOutcome::Expired
            )
        });
        assert!(expired);
        assert_eq!(engine.state().knocks.pending().count(), 0);
    }
}
