//! Pending actions and the resolve cycle.
//!
//! Entries are kept in submission order; [`ordering`] computes the
//! resolution order on demand. A resolve cycle applies every unblocked entry
//! and removes it. Blocked entries stay queued and are retried on the next
//! cycle, so a block that expires in between lets them through.

pub mod ordering;

use crate::ability::{AbilityKey, Category, Team};
use crate::blocks::BlockRegistry;
use crate::inventory::{Holder, TokenInventory, VisitKind};
use crate::state::{ActionId, ActorId, LocationId};

/// Longest description kept on a pending action, in characters. Longer
/// text is truncated on submit.
pub const MAX_DESCRIPTION_CHARS: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueError {
    #[error("no pending action {0}")]
    ActionNotFound(ActionId),

    #[error("queue is full ({limit} pending actions)")]
    QueueFull { limit: usize },
}

impl crate::error::GameError for QueueError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        match self {
            Self::ActionNotFound(_) => crate::error::ErrorSeverity::Validation,
            Self::QueueFull { .. } => crate::error::ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActionNotFound(_) => "QUEUE_ACTION_NOT_FOUND",
            Self::QueueFull { .. } => "QUEUE_FULL",
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    Processed,
}

/// Why a resolve cycle left an action queued.
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
pub enum SkipReason {
    AbilityBlocked,
    VisitBlocked,
}

/// Submission payload; category and team are captured from the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAction {
    pub actor: ActorId,
    pub location: LocationId,
    pub ability: AbilityKey,
    pub category: Category,
    pub team: Option<Team>,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingAction {
    pub id: ActionId,
    pub actor: ActorId,
    pub location: LocationId,
    pub ability: AbilityKey,
    pub category: Category,
    pub team: Option<Team>,
    /// Strictly increasing per session; final tie-breaker in ordering.
    pub submitted_at: u64,
    pub description: String,
    pub status: ActionStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedAction {
    pub action: PendingAction,
    /// Visit drawn from the location pool, if it had any.
    pub consumed: Option<VisitKind>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkippedAction {
    pub action: PendingAction,
    pub reason: SkipReason,
}

/// Partition produced by one resolve cycle, each side in resolution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionReport {
    pub applied: Vec<AppliedAction>,
    pub skipped: Vec<SkippedAction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionQueue {
    entries: Vec<PendingAction>,
    next_seq: u64,
    next_id: u64,
}

impl ResolutionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action. Duplicates are legal and resolve independently.
    ///
    /// The description is cut to [`MAX_DESCRIPTION_CHARS`].
    pub fn submit(&mut self, action: NewAction) -> &PendingAction {
        self.next_id += 1;
        self.next_seq += 1;
        let NewAction {
            actor,
            location,
            ability,
            category,
            team,
            mut description,
        } = action;
        if let Some((cut, _)) = description.char_indices().nth(MAX_DESCRIPTION_CHARS) {
            description.truncate(cut);
        }
        self.entries.push(PendingAction {
            id: ActionId(self.next_id),
            actor,
            location,
            ability,
            category,
            team,
            submitted_at: self.next_seq,
            description,
            status: ActionStatus::Pending,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn cancel(&mut self, id: ActionId) -> Result<PendingAction, QueueError> {
        let idx = self
            .entries
            .iter()
            .position(|action| action.id == id)
            .ok_or(QueueError::ActionNotFound(id))?;
        Ok(self.entries.remove(idx))
    }

    pub fn get(&self, id: ActionId) -> Option<&PendingAction> {
        self.entries.iter().find(|action| action.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending actions in resolution order.
    pub fn order(&self) -> Vec<&PendingAction> {
        ordering::order(&self.entries)
    }

    /// Applies every pending action in resolution order.
    ///
    /// Block checks happen before the visit is drawn, within the same call.
    /// Drawing a visit is best-effort: an empty location pool does not stop
    /// the action from applying.
    pub fn resolve_cycle(
        &mut self,
        blocks: &BlockRegistry,
        inventory: &mut TokenInventory,
    ) -> ResolutionReport {
        let mut indices: Vec<usize> = (0..self.entries.len()).collect();
        indices.sort_by_key(|&idx| ordering::sort_key(&self.entries[idx]));

        let mut report = ResolutionReport::default();
        for idx in indices {
            let action = &mut self.entries[idx];

            let reason = if blocks.is_ability_blocked(action.location, action.ability) {
                Some(SkipReason::AbilityBlocked)
            } else if blocks.is_location_visit_blocked(action.location) {
                Some(SkipReason::VisitBlocked)
            } else {
                None
            };

            if let Some(reason) = reason {
                report.skipped.push(SkippedAction {
                    action: action.clone(),
                    reason,
                });
                continue;
            }

            let consumed = inventory.consume_preferred(Holder::Location(action.location));
            action.status = ActionStatus::Processed;
            report.applied.push(AppliedAction {
                action: action.clone(),
                consumed,
            });
        }

        self.entries
            .retain(|action| action.status == ActionStatus::Pending);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockSpan;

    fn action(location: u64, ability: u32, category: Category, team: Option<&str>) -> NewAction {
        NewAction {
            actor: ActorId(location),
            location: LocationId(location),
            ability: AbilityKey(ability),
            category,
            team: team.map(Team::new),
            description: format!("{category} from {location}"),
        }
    }

    fn descriptions(actions: &[&PendingAction]) -> Vec<String> {
        actions.iter().map(|a| a.description.clone()).collect()
    }

    #[test]
    fn orders_by_category_then_team_then_submission() {
        let mut queue = ResolutionQueue::new();
        queue.submit(action(1, 1, Category::Other, None));
        queue.submit(action(2, 1, Category::Protection, Some("neutral")));
        queue.submit(action(3, 1, Category::Protection, Some("dark")));
        queue.submit(action(4, 1, Category::Manipulation, None));
        queue.submit(action(5, 1, Category::Information, Some("dark")));

        let order: Vec<_> = queue.order().iter().map(|a| a.location).collect();
        assert_eq!(
            order,
            vec![
                LocationId(4),
                LocationId(3),
                LocationId(2),
                LocationId(1),
                LocationId(5)
            ]
        );
    }

    #[test]
    fn lethal_shadow_resolves_before_dark() {
        let mut queue = ResolutionQueue::new();
        queue.submit(action(1, 1, Category::Lethal, Some("dark")));
        queue.submit(action(2, 1, Category::Lethal, Some("shadow")));

        let order: Vec<_> = queue.order().iter().map(|a| a.location).collect();
        assert_eq!(order, vec![LocationId(2), LocationId(1)]);
    }

    #[test]
    fn interleaving_preserving_relative_order_gives_same_result() {
        let group_a = [
            action(1, 1, Category::Lethal, Some("dark")),
            action(1, 2, Category::Lethal, Some("dark")),
        ];
        let group_b = [
            action(2, 1, Category::Blocking, Some("rk")),
            action(3, 1, Category::Blocking, Some("rk")),
        ];

        let mut first = ResolutionQueue::new();
        for a in group_a.iter().chain(group_b.iter()) {
            first.submit(a.clone());
        }

        let mut second = ResolutionQueue::new();
        for (a, b) in group_a.iter().zip(group_b.iter()) {
            second.submit(b.clone());
            second.submit(a.clone());
        }

        assert_eq!(descriptions(&first.order()), descriptions(&second.order()));
        let abilities: Vec<_> = second.order().iter().map(|a| (a.location, a.ability)).collect();
        assert_eq!(abilities[2], (LocationId(1), AbilityKey(1)));
        assert_eq!(abilities[3], (LocationId(1), AbilityKey(2)));
    }

    #[test]
    fn submitted_at_is_strictly_increasing() {
        let mut queue = ResolutionQueue::new();
        let first = queue.submit(action(1, 1, Category::Other, None)).submitted_at;
        let second = queue.submit(action(1, 1, Category::Other, None)).submitted_at;
        assert!(second > first);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn blocked_actions_stay_queued_for_retry() {
        let mut queue = ResolutionQueue::new();
        let mut blocks = BlockRegistry::new();
        let mut inventory = TokenInventory::new();

        queue.submit(action(1, 1, Category::Lethal, None));
        queue.submit(action(2, 1, Category::Protection, None));
        queue.submit(action(3, 1, Category::Other, None));
        blocks.block_ability(LocationId(1), AbilityKey(1), BlockSpan::forever());
        blocks.block_location_visits(LocationId(2), BlockSpan::forever());

        let report = queue.resolve_cycle(&blocks, &mut inventory);
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].action.status, ActionStatus::Processed);
        let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::VisitBlocked, SkipReason::AbilityBlocked]);
        assert_eq!(queue.len(), 2);

        blocks.unblock_ability(LocationId(1), AbilityKey(1));
        let retry = queue.resolve_cycle(&blocks, &mut inventory);
        assert_eq!(retry.applied.len(), 1);
        assert_eq!(retry.applied[0].action.location, LocationId(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn ability_block_takes_precedence_over_visit_block() {
        let mut queue = ResolutionQueue::new();
        let mut blocks = BlockRegistry::new();
        queue.submit(action(1, 1, Category::Other, None));
        blocks.block_ability(LocationId(1), AbilityKey(1), BlockSpan::forever());
        blocks.block_location_visits(LocationId(1), BlockSpan::forever());

        let report = queue.resolve_cycle(&blocks, &mut TokenInventory::new());
        assert_eq!(report.skipped[0].reason, SkipReason::AbilityBlocked);
    }

    #[test]
    fn visit_consumption_is_best_effort() {
        let mut queue = ResolutionQueue::new();
        let mut inventory = TokenInventory::new();
        inventory.grant(LocationId(1), VisitKind::Stealth, 1);

        queue.submit(action(1, 1, Category::Other, None));
        queue.submit(action(1, 2, Category::Other, None));

        let report = queue.resolve_cycle(&BlockRegistry::new(), &mut inventory);
        let consumed: Vec<_> = report.applied.iter().map(|a| a.consumed).collect();
        assert_eq!(consumed, vec![Some(VisitKind::Stealth), None]);
        assert!(queue.is_empty());
    }

    #[test]
    fn long_descriptions_are_truncated_on_char_boundaries() {
        let mut queue = ResolutionQueue::new();
        let mut long = action(1, 1, Category::Other, None);
        long.description = "é".repeat(MAX_DESCRIPTION_CHARS + 10);
        let stored = &queue.submit(long).description;
        assert_eq!(stored.chars().count(), MAX_DESCRIPTION_CHARS);

        let mut exact = action(1, 1, Category::Other, None);
        exact.description = "x".repeat(MAX_DESCRIPTION_CHARS);
        assert_eq!(queue.submit(exact).description.len(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn cancel_removes_only_the_named_action() {
        let mut queue = ResolutionQueue::new();
        let id = queue.submit(action(1, 1, Category::Other, None)).id;
        queue.submit(action(2, 1, Category::Other, None));

        assert_eq!(queue.cancel(id).map(|a| a.id), Ok(id));
        assert_eq!(queue.cancel(id), Err(QueueError::ActionNotFound(id)));
        assert_eq!(queue.len(), 1);
    }
}
