//! Reply text contracts. Everything user-visible the desk says lives
//! here so the wording stays in one place.

use rollcall_store::StatRecord;

use crate::engine::ReconcileOutcome;

pub const STORE_UNAVAILABLE: &str =
    "System error: the signup sheet is unreachable. Please contact an administrator.";

pub fn outcome(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::NotSignedUp => "You are not currently signed up.".to_string(),
        ReconcileOutcome::Cancelled => "All of your signups have been cancelled.".to_string(),
        ReconcileOutcome::Updated {
            approved,
            waitlisted,
        } => match (approved, waitlisted) {
            (a, 0) => format!("Updated: {a} approved."),
            (0, w) => format!("Updated: {w} waitlisted."),
            (a, w) => format!("Updated: {a} approved, {w} waitlisted."),
        },
    }
}

/// Renders statistics hits, one `description (name)` line per record.
/// Returns `None` when there are no hits.
pub fn stat_hits(hits: &[StatRecord]) -> Option<String> {
    if hits.is_empty() {
        return None;
    }
    Some(
        hits.iter()
            .map(|s| format!("{} ({})", s.description, s.name))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

pub fn no_stats_self() -> String {
    "No data found for you.".to_string()
}

pub fn no_stats_for(name: &str) -> String {
    format!("No data found for {name}.")
}

pub fn stat_listing(all: &[StatRecord]) -> String {
    if all.is_empty() {
        return "No data yet.".to_string();
    }
    let mut lines = vec!["Statistics:".to_string()];
    lines.extend(all.iter().map(|s| format!("{}: {}", s.name, s.description)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_phrasing_covers_all_splits() {
        assert_eq!(
            outcome(&ReconcileOutcome::Updated {
                approved: 2,
                waitlisted: 0
            }),
            "Updated: 2 approved."
        );
        assert_eq!(
            outcome(&ReconcileOutcome::Updated {
                approved: 0,
                waitlisted: 3
            }),
            "Updated: 3 waitlisted."
        );
        assert_eq!(
            outcome(&ReconcileOutcome::Updated {
                approved: 2,
                waitlisted: 1
            }),
            "Updated: 2 approved, 1 waitlisted."
        );
    }

    #[test]
    fn empty_stat_hits_is_none() {
        assert!(stat_hits(&[]).is_none());
        assert_eq!(stat_listing(&[]), "No data yet.");
    }
}
