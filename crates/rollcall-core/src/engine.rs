use std::time::{SystemTime, UNIX_EPOCH};

use rollcall_store::{LedgerStore, RowOp, SignupRecord, SignupStatus};

use crate::error::SignupError;

/// Name recorded when neither the command nor the ledger carries one.
pub const FALLBACK_DISPLAY_NAME: &str = "unknown";

/// Result of reconciling one user's row set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Removal requested but the user held no seats.
    NotSignedUp,
    /// The user's total reached 0; every row was deleted.
    Cancelled,
    Updated { approved: u32, waitlisted: u32 },
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Recomputes one user's approved/waitlisted split after a seat delta.
///
/// Sticky-approval policy: other users' approved rows are never revisited
/// here. Capacity is allocated to the acting user only out of what remains
/// after everyone else's current approved totals, so an already-approved
/// user is never bumped by a third party's request.
///
/// The caller must hold the deployment's command lock: the sequence below
/// is read-modify-write over the whole ledger.
pub fn reconcile<L: LedgerStore + ?Sized>(
    ledger: &L,
    capacity: u32,
    user_id: &str,
    display_name: &str,
    delta: i64,
) -> Result<ReconcileOutcome, SignupError> {
    let rows = ledger.list_rows()?;

    // Partition: this user's rows (possibly more than two if the store is
    // in a legacy-inconsistent state) vs. everyone else's approved seats.
    let mut user_rows: Vec<usize> = Vec::new();
    let mut others_approved: u64 = 0;
    let mut current_total: i64 = 0;
    let mut name = display_name.trim().to_string();

    for (i, row) in rows.iter().enumerate() {
        if row.user_id == user_id {
            user_rows.push(i);
            current_total += i64::from(row.count);
            if name.is_empty() && !row.display_name.is_empty() {
                name = row.display_name.clone();
            }
        } else if row.status == SignupStatus::Approved {
            others_approved += u64::from(row.count);
        }
    }

    let new_total = current_total.saturating_add(delta).max(0) as u64;

    if new_total == 0 {
        if current_total == 0 {
            return Ok(ReconcileOutcome::NotSignedUp);
        }
        let ops: Vec<RowOp> = user_rows.iter().rev().map(|&i| RowOp::Delete(i)).collect();
        ledger.apply(&ops)?;
        return Ok(ReconcileOutcome::Cancelled);
    }

    if name.is_empty() {
        tracing::warn!(user_id, "no display name available, recording fallback");
        name = FALLBACK_DISPLAY_NAME.to_string();
    }

    let remaining = u64::from(capacity).saturating_sub(others_approved);
    let new_approved = new_total.min(remaining) as u32;
    let new_waitlisted = (new_total - u64::from(new_approved)) as u32;

    // Keep the first existing row per status (ledger order), delete the
    // rest; a kept row whose target count is 0 is deleted too.
    let mut keep_approved: Option<usize> = None;
    let mut keep_waitlisted: Option<usize> = None;
    for &i in &user_rows {
        match rows[i].status {
            SignupStatus::Approved if keep_approved.is_none() => keep_approved = Some(i),
            SignupStatus::Waitlisted if keep_waitlisted.is_none() => keep_waitlisted = Some(i),
            _ => {}
        }
    }

    let mut deletions: Vec<usize> = user_rows
        .iter()
        .copied()
        .filter(|&i| Some(i) != keep_approved && Some(i) != keep_waitlisted)
        .collect();
    if new_approved == 0 {
        if let Some(i) = keep_approved.take() {
            deletions.push(i);
        }
    }
    if new_waitlisted == 0 {
        if let Some(i) = keep_waitlisted.take() {
            deletions.push(i);
        }
    }
    deletions.sort_unstable();

    // Row positions shift as earlier rows are deleted; the update indices
    // are emitted pre-adjusted so the plan replays front to back.
    let shift = |row: usize| row - deletions.iter().filter(|&&d| d < row).count();
    let now = now_ms();

    let mut ops: Vec<RowOp> = deletions.iter().rev().map(|&i| RowOp::Delete(i)).collect();
    for (target, kept, status) in [
        (new_approved, keep_approved, SignupStatus::Approved),
        (new_waitlisted, keep_waitlisted, SignupStatus::Waitlisted),
    ] {
        if target == 0 {
            continue;
        }
        match kept {
            // Unchanged rows are left alone so a zero-delta re-evaluation
            // rewrites nothing (and keeps its original timestamp).
            Some(i) if rows[i].count == target => {}
            Some(i) => ops.push(RowOp::Update {
                row: shift(i),
                count: target,
                updated_ms: now,
            }),
            None => ops.push(RowOp::Append(SignupRecord {
                user_id: user_id.to_string(),
                display_name: name.clone(),
                count: target,
                status,
                updated_ms: now,
                note: None,
            })),
        }
    }

    if !ops.is_empty() {
        ledger.apply(&ops)?;
    }
    Ok(ReconcileOutcome::Updated {
        approved: new_approved,
        waitlisted: new_waitlisted,
    })
}

/// Re-reconciles every currently waitlisted user with a zero delta, in
/// ledger order (earliest waitlisted row first). Each call can only move
/// that user's seats from waitlisted to approved, so one pass over the
/// initial snapshot suffices and a second run is a no-op.
pub fn promote_waitlist<L: LedgerStore + ?Sized>(
    ledger: &L,
    capacity: u32,
) -> Result<(), SignupError> {
    let rows = ledger.list_rows()?;

    let mut queue: Vec<(String, String)> = Vec::new();
    for row in &rows {
        if row.status != SignupStatus::Waitlisted {
            continue;
        }
        if queue.iter().any(|(id, _)| id == &row.user_id) {
            continue;
        }
        let name = rows
            .iter()
            .find(|r| r.user_id == row.user_id && !r.display_name.is_empty())
            .map(|r| r.display_name.clone())
            .unwrap_or_default();
        queue.push((row.user_id.clone(), name));
    }

    for (user_id, name) in queue {
        reconcile(ledger, capacity, &user_id, &name, 0)?;
    }
    Ok(())
}
