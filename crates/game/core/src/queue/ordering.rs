//! Deterministic resolution order.
//!
//! Composite key `(category priority, team index, submitted_at)`. Lethal
//! actions use their own team table; both tables are fixed game rules.

use crate::ability::{Category, Team};

use super::PendingAction;

/// Team precedence for lethal actions.
pub const LETHAL_TEAM_ORDER: [&str; 4] = ["sublime", "shadow", "dark", "neutral"];

/// Team precedence for every other category.
pub const DEFAULT_TEAM_ORDER: [&str; 4] = ["dark", "rk", "sublime", "neutral"];

/// Index for teams missing from the relevant table, including no team.
pub const UNRANKED_TEAM: u8 = 99;

pub fn team_index(category: Category, team: Option<&Team>) -> u8 {
    let table = match category {
        Category::Lethal => &LETHAL_TEAM_ORDER,
        _ => &DEFAULT_TEAM_ORDER,
    };
    team.and_then(|team| table.iter().position(|name| *name == team.as_str()))
        .and_then(|idx| u8::try_from(idx).ok())
        .unwrap_or(UNRANKED_TEAM)
}

pub fn sort_key(action: &PendingAction) -> (u8, u8, u64) {
    (
        action.category.priority(),
        team_index(action.category, action.team.as_ref()),
        action.submitted_at,
    )
}

/// Stable sort of `actions` into resolution order.
pub fn order<'a, I>(actions: I) -> Vec<&'a PendingAction>
where
    I: IntoIterator<Item = &'a PendingAction>,
{
    let mut ordered: Vec<&PendingAction> = actions.into_iter().collect();
    ordered.sort_by_key(|action| sort_key(action));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lethal_and_default_tables_differ() {
        let dark = Team::new("dark");
        let shadow = Team::new("shadow");
        assert_eq!(team_index(Category::Lethal, Some(&shadow)), 1);
        assert_eq!(team_index(Category::Lethal, Some(&dark)), 2);
        assert_eq!(team_index(Category::Protection, Some(&dark)), 0);
        assert_eq!(
            team_index(Category::Protection, Some(&shadow)),
            UNRANKED_TEAM
        );
    }

    #[test]
    fn missing_team_sorts_last() {
        assert_eq!(team_index(Category::Lethal, None), UNRANKED_TEAM);
        assert_eq!(
            team_index(Category::Other, Some(&Team::new("?"))),
            UNRANKED_TEAM
        );
    }
}
