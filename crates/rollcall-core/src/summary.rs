use rollcall_store::{LedgerStore, SignupStatus};

use crate::error::SignupError;
use crate::settings::Settings;

const RULE: &str = "----------------";

/// Renders the deterministic status report: one line per ledger row in
/// stored order, then the running approved total against capacity.
pub fn render_summary<L: LedgerStore + ?Sized>(
    ledger: &L,
    settings: &Settings,
) -> Result<String, SignupError> {
    let rows = ledger.list_rows()?;

    let mut lines = Vec::with_capacity(rows.len() + 5);
    lines.push(settings.title.clone());
    if !settings.description.is_empty() {
        lines.push(settings.description.clone());
    }
    lines.push(RULE.to_string());

    let mut approved_total: u64 = 0;
    for (i, row) in rows.iter().enumerate() {
        let marker = match row.status {
            SignupStatus::Approved => {
                approved_total += u64::from(row.count);
                "[approved]"
            }
            SignupStatus::Waitlisted => "[waitlisted]",
        };
        lines.push(format!(
            "{}. {} (+{}) {}",
            i + 1,
            row.display_name,
            row.count,
            marker
        ));
    }

    lines.push(RULE.to_string());
    lines.push(format!("approved {approved_total} / {}", settings.capacity));
    Ok(lines.join("\n"))
}
