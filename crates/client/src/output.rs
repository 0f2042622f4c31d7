//! Human-readable rendering of command results and events.

use async_trait::async_trait;
use game_core::{KnockStart, PendingAction, Preset, SessionState};
use runtime::{Event, Notifier, Outcome};

pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Done => "ok".to_string(),
        Outcome::Removed(assignment) => {
            format!("removed {} ({})", assignment.key, assignment.category)
        }
        Outcome::Submitted(id) => format!("queued {id}"),
        Outcome::Cancelled(action) => format!("cancelled {}", action.id),
        Outcome::Resolved(report) => {
            let mut lines = vec![format!(
                "resolved: {} applied, {} skipped",
                report.applied.len(),
                report.skipped.len()
            )];
            for applied in &report.applied {
                let drawn = applied
                    .consumed
                    .map(|kind| format!(" [{kind} visit]"))
                    .unwrap_or_default();
                lines.push(format!("  applied {}{drawn}", action_line(&applied.action)));
            }
            for skipped in &report.skipped {
                lines.push(format!(
                    "  skipped {} ({})",
                    action_line(&skipped.action),
                    skipped.reason
                ));
            }
            lines.join("\n")
        }
        Outcome::Phase(transition) => format!("{} -> {}", transition.previous, transition.current),
        Outcome::Visits(count) => format!("now {count}"),
        Outcome::Unblocked(true) => "unblocked".to_string(),
        Outcome::Unblocked(false) => "nothing to unblock".to_string(),
        Outcome::Placed(Some(previous)) => format!("moved from {previous}"),
        Outcome::Placed(None) => "no previous location".to_string(),
        Outcome::PresetAdded(position) => format!("saved preset {position}"),
        Outcome::Presets(page) => {
            let mut lines = vec![format!(
                "presets for {} (page {}/{})",
                page.location, page.page, page.pages
            )];
            for (offset, preset) in page.entries.iter().enumerate() {
                lines.push(format!("  {}. {}", page.first + offset, preset_line(preset)));
            }
            lines.join("\n")
        }
        Outcome::PresetBook(book) if book.is_empty() => "no presets stored".to_string(),
        Outcome::PresetBook(book) => {
            let mut lines = Vec::new();
            for (location, presets) in book {
                lines.push(format!("{location}:"));
                for (idx, preset) in presets.iter().enumerate() {
                    lines.push(format!("  {}. {}", idx + 1, preset_line(preset)));
                }
            }
            lines.join("\n")
        }
        Outcome::PresetRemoved(preset) => format!("removed preset \"{}\"", preset.text),
        Outcome::Knock(KnockStart::Requested(ticket)) => {
            format!("{} waiting at {}", ticket.token, ticket.target)
        }
        Outcome::Knock(KnockStart::Executed(resolution)) => match resolution.movement {
            Some(movement) => {
                format!("{} moved {} -> {}", movement.actor, movement.from, movement.to)
            }
            None => resolution.outcome.to_string(),
        },
        Outcome::KnockReply(None) => "ignored".to_string(),
        Outcome::KnockReply(Some(resolution)) => {
            format!("{} {}", resolution.ticket.token, resolution.outcome)
        }
        Outcome::KnockCancelled(ticket) => format!("withdrew {}", ticket.token),
    }
}

pub fn action_line(action: &PendingAction) -> String {
    let team = action.team.as_ref().map(|team| team.as_str()).unwrap_or("-");
    format!(
        "{} {} {}/{} {} team={} \"{}\"",
        action.id,
        action.actor,
        action.location,
        action.ability,
        action.category,
        team,
        action.description
    )
}

/// `[category] A1 text` when the preset names a known ability.
pub fn preset_line(preset: &Preset) -> String {
    match &preset.ability {
        Some(ability) => format!("[{}] {} {}", ability.category, ability.key, preset.text),
        None => preset.text.clone(),
    }
}

pub fn summarize(state: &SessionState) -> Vec<String> {
    let mut lines = vec![
        format!("phase: {}", state.clock.reading()),
        format!("pending actions: {}", state.queue.len()),
        format!("pending knocks: {}", state.knocks.pending().count()),
        format!("active blocks: {}", state.blocks.len()),
        format!("preset locations: {}", state.presets.iter().count()),
    ];
    for (holder, counts) in state.inventory.holders() {
        lines.push(format!("  {holder}: {counts}"));
    }
    for (actor, location) in state.whereabouts.iter() {
        lines.push(format!("  {actor} at {location}"));
    }
    lines
}

/// Prints each event as one JSON line.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, event: &Event) -> runtime::Result<()> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|err| runtime::RuntimeError::Notifier(err.to_string()))?;
        println!("event {} {}", event.sequence, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{
        AbilityKey, ActionId, Category, LocationId, PhaseReading, PhaseTransition, PresetAbility,
        PresetPage,
    };

    #[test]
    fn phase_changes_read_naturally() {
        let outcome = Outcome::Phase(PhaseTransition {
            previous: PhaseReading::night(1),
            current: PhaseReading::day(2),
        });
        assert_eq!(describe(&outcome), "Night 1 -> Day 2");
        assert_eq!(describe(&Outcome::Submitted(ActionId(4))), "queued action#4");
        assert_eq!(describe(&Outcome::KnockReply(None)), "ignored");
    }

    #[test]
    fn preset_pages_number_from_the_first_entry() {
        let page = PresetPage {
            location: LocationId(2),
            page: 2,
            pages: 2,
            first: 6,
            entries: vec![Preset {
                text: "guard the cellar".into(),
                ability: Some(PresetAbility {
                    key: AbilityKey(1),
                    category: Category::Protection,
                    team: None,
                }),
                saved_at: 6,
            }],
        };
        assert_eq!(
            describe(&Outcome::Presets(page)),
            "presets for loc#2 (page 2/2)\n  6. [protection] A1 guard the cellar"
        );
    }

    #[test]
    fn summary_lists_the_clock_first() {
        let lines = summarize(&SessionState::new());
        assert_eq!(lines[0], "phase: pregame");
        assert_eq!(lines.len(), 5);
    }
}
