//! Cloneable façade for issuing commands to one session.
//!
//! [`SessionHandle`] hides channel plumbing and offers async helpers for
//! the common engine calls or streaming events from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::{
    AbilityAssignment, AbilityKey, ActionId, ActorId, BlockSpan, Category, CorrelationToken,
    Holder, KnockRequest, KnockResolution, KnockStart, KnockVerdict, LocationId, PhaseToken,
    PhaseTransition, PresetPage, ResolutionReport, SessionState, VisitKind,
};

use super::errors::{Result, RuntimeError};
use super::operation::{Operation, Outcome};
use crate::events::{Event, EventBus, Topic};
use crate::types::SessionId;
use crate::workers::Command;

/// Client-facing handle to interact with a session worker
#[derive(Clone)]
pub struct SessionHandle {
    session: SessionId,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(
        session: SessionId,
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            session,
            command_tx,
            event_bus,
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Apply one operation; commands are processed strictly in arrival order
    pub async fn execute(&self, op: Operation) -> Result<Outcome> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Execute {
                op,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    async fn execute_as<T>(
        &self,
        op: Operation,
        pick: impl FnOnce(Outcome) -> Option<T>,
    ) -> Result<T> {
        let operation = op.name();
        let outcome = self.execute(op).await?;
        pick(outcome).ok_or(RuntimeError::UnexpectedReply { operation })
    }

    pub async fn submit_action(
        &self,
        actor: ActorId,
        location: LocationId,
        key: AbilityKey,
        description: impl Into<String>,
    ) -> Result<ActionId> {
        let op = Operation::SubmitAction {
            actor,
            location,
            key,
            description: description.into(),
        };
        self.execute_as(op, |outcome| match outcome {
            Outcome::Submitted(id) => Some(id),
            _ => None,
        })
        .await
    }

    pub async fn resolve_cycle(&self) -> Result<ResolutionReport> {
        self.execute_as(Operation::ResolveCycle, |outcome| match outcome {
            Outcome::Resolved(report) => Some(report),
            _ => None,
        })
        .await
    }

    pub async fn advance_phase(&self, target: PhaseToken) -> Result<PhaseTransition> {
        self.execute_as(Operation::AdvancePhase { target }, |outcome| match outcome {
            Outcome::Phase(transition) => Some(transition),
            _ => None,
        })
        .await
    }

    pub async fn grant_visits(
        &self,
        holder: impl Into<Holder>,
        kind: VisitKind,
        amount: u32,
    ) -> Result<u32> {
        let op = Operation::GrantVisits {
            holder: holder.into(),
            kind,
            amount,
        };
        self.execute_as(op, |outcome| match outcome {
            Outcome::Visits(count) => Some(count),
            _ => None,
        })
        .await
    }

    pub async fn place_actor(
        &self,
        actor: ActorId,
        location: LocationId,
    ) -> Result<Option<LocationId>> {
        let op = Operation::PlaceActor { actor, location };
        self.execute_as(op, |outcome| match outcome {
            Outcome::Placed(previous) => Some(previous),
            _ => None,
        })
        .await
    }

    /// Saves a preset, returning its 1-based position
    pub async fn add_preset(
        &self,
        location: LocationId,
        text: impl Into<String>,
    ) -> Result<usize> {
        let op = Operation::AddPreset {
            location,
            text: text.into(),
        };
        self.execute_as(op, |outcome| match outcome {
            Outcome::PresetAdded(position) => Some(position),
            _ => None,
        })
        .await
    }

    pub async fn presets(&self, location: LocationId, page: usize) -> Result<PresetPage> {
        self.execute_as(Operation::ListPresets { location, page }, |outcome| match outcome {
            Outcome::Presets(page) => Some(page),
            _ => None,
        })
        .await
    }

    pub async fn request_knock(&self, request: KnockRequest) -> Result<KnockStart> {
        self.execute_as(Operation::RequestKnock(request), |outcome| match outcome {
            Outcome::Knock(start) => Some(start),
            _ => None,
        })
        .await
    }

    pub async fn respond_knock(
        &self,
        token: CorrelationToken,
        verdict: KnockVerdict,
        responder: ActorId,
    ) -> Result<Option<KnockResolution>> {
        let op = Operation::RespondKnock {
            token,
            verdict,
            responder,
        };
        self.execute_as(op, |outcome| match outcome {
            Outcome::KnockReply(reply) => Some(reply),
            _ => None,
        })
        .await
    }

    pub async fn assign_ability(
        &self,
        location: LocationId,
        key: AbilityKey,
        category: Category,
        uses: impl Into<String>,
    ) -> Result<()> {
        let op = Operation::AssignAbility {
            location,
            key,
            category,
            uses: uses.into(),
        };
        self.execute_as(op, done).await
    }

    pub async fn remove_ability(
        &self,
        location: LocationId,
        key: AbilityKey,
    ) -> Result<AbilityAssignment> {
        let op = Operation::RemoveAbility { location, key };
        self.execute_as(op, |outcome| match outcome {
            Outcome::Removed(assignment) => Some(assignment),
            _ => None,
        })
        .await
    }

    pub async fn reset_phase_counter(&self) -> Result<PhaseTransition> {
        self.execute_as(Operation::ResetPhaseCounter, |outcome| match outcome {
            Outcome::Phase(transition) => Some(transition),
            _ => None,
        })
        .await
    }

    /// Floors at zero.
    pub async fn remove_visits(
        &self,
        holder: impl Into<Holder>,
        kind: VisitKind,
        amount: u32,
    ) -> Result<u32> {
        let op = Operation::RemoveVisits {
            holder: holder.into(),
            kind,
            amount,
        };
        self.execute_as(op, |outcome| match outcome {
            Outcome::Visits(count) => Some(count),
            _ => None,
        })
        .await
    }

    pub async fn block_ability(
        &self,
        location: LocationId,
        key: AbilityKey,
        span: BlockSpan,
    ) -> Result<()> {
        let op = Operation::BlockAbility {
            location,
            key,
            span,
        };
        self.execute_as(op, done).await
    }

    pub async fn unblock_ability(&self, location: LocationId, key: AbilityKey) -> Result<bool> {
        let op = Operation::UnblockAbility { location, key };
        self.execute_as(op, unblocked).await
    }

    pub async fn block_location_visits(&self, location: LocationId, span: BlockSpan) -> Result<()> {
        let op = Operation::BlockLocationVisits { location, span };
        self.execute_as(op, done).await
    }

    pub async fn unblock_location_visits(&self, location: LocationId) -> Result<bool> {
        let op = Operation::UnblockLocationVisits { location };
        self.execute_as(op, unblocked).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Resolution` - Applied and skipped actions
    /// - `Topic::Phase` - Clock changes, refills and expired blocks
    /// - `Topic::Knock` - Knock tickets and outcomes
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut knocks = handle.subscribe(Topic::Knock);
    /// while let Ok(event) = knocks.recv().await {
    ///     // Deliver the knock to the target location
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Query the current session state (read-only snapshot)
    pub async fn query_state(&self) -> Result<SessionState> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::QueryState { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Hex-encoded state root of the current snapshot
    pub async fn state_root(&self) -> Result<String> {
        let state = self.query_state().await?;
        let root = state.state_root().map_err(RuntimeError::StateEncoding)?;
        Ok(hex::encode(root))
    }

    /// Ask the worker to stop after the commands already queued
    pub(crate) async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

fn done(outcome: Outcome) -> Option<()> {
    matches!(outcome, Outcome::Done).then_some(())
}

fn unblocked(outcome: Outcome) -> Option<bool> {
    match outcome {
        Outcome::Unblocked(lifted) => Some(lifted),
        _ => None,
    }
}
