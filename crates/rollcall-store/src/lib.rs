//! Row-oriented signup storage abstractions plus an in-memory backend.
//!
//! The ledger is an ordered sequence of signup rows; insertion order is
//! significant (it drives promotion precedence and summary display order).
//! Row references are zero-based positions, stable only within a single
//! engine invocation: deleting a row shifts the positions of every row
//! after it, exactly like a spreadsheet.

mod mem_store;
mod record;

pub use mem_store::MemStore;
pub use record::{SignupRecord, SignupStatus, StatRecord, parse_count};

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;
pub type DynLedgerStore = Arc<dyn LedgerStore>;
pub type DynSettingsProvider = Arc<dyn SettingsProvider>;
pub type DynStatsStore = Arc<dyn StatsStore>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store backend unavailable: {0}")]
    Backend(String),
    #[error("row {0} out of range")]
    RowOutOfRange(usize),
}

/// Single-field update against one ledger row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowPatch {
    Count(u32),
    Status(SignupStatus),
    UpdatedMs(u64),
    DisplayName(String),
}

/// One step of a reconcile plan. The engine emits deletes in descending
/// row order with update indices already adjusted for them, so replaying
/// the ops front to back is position-safe on any backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowOp {
    Delete(usize),
    Update {
        row: usize,
        count: u32,
        updated_ms: u64,
    },
    Append(SignupRecord),
}

/// Ordered collection of signup rows. No multi-row transaction guarantee
/// is assumed; backends that have one override [`LedgerStore::apply`].
pub trait LedgerStore: Send + Sync {
    fn list_rows(&self) -> StoreResult<Vec<SignupRecord>>;
    fn append_row(&self, record: &SignupRecord) -> StoreResult<()>;
    fn update_field(&self, row: usize, patch: RowPatch) -> StoreResult<()>;
    fn delete_row(&self, row: usize) -> StoreResult<()>;

    /// Replays a reconcile plan op by op.
    fn apply(&self, ops: &[RowOp]) -> StoreResult<()> {
        for op in ops {
            match op {
                RowOp::Delete(row) => self.delete_row(*row)?,
                RowOp::Update {
                    row,
                    count,
                    updated_ms,
                } => {
                    self.update_field(*row, RowPatch::Count(*count))?;
                    self.update_field(*row, RowPatch::UpdatedMs(*updated_ms))?;
                }
                RowOp::Append(record) => self.append_row(record)?,
            }
        }
        Ok(())
    }
}

/// Key/value event configuration. Missing keys fall back to documented
/// defaults; the engine never writes settings.
pub trait SettingsProvider: Send + Sync {
    fn get_settings(&self) -> StoreResult<BTreeMap<String, String>>;
}

/// Flat statistics table, queried by user id or exact name.
pub trait StatsStore: Send + Sync {
    fn lookup_by_user(&self, user_id: &str) -> StoreResult<Vec<StatRecord>>;
    fn lookup_by_name(&self, name: &str) -> StoreResult<Vec<StatRecord>>;
    fn list_all(&self) -> StoreResult<Vec<StatRecord>>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn list_rows(&self) -> StoreResult<Vec<SignupRecord>> {
        (**self).list_rows()
    }

    fn append_row(&self, record: &SignupRecord) -> StoreResult<()> {
        (**self).append_row(record)
    }

    fn update_field(&self, row: usize, patch: RowPatch) -> StoreResult<()> {
        (**self).update_field(row, patch)
    }

    fn delete_row(&self, row: usize) -> StoreResult<()> {
        (**self).delete_row(row)
    }

    // Delegated so transactional overrides are not bypassed.
    fn apply(&self, ops: &[RowOp]) -> StoreResult<()> {
        (**self).apply(ops)
    }
}

impl<T: SettingsProvider + ?Sized> SettingsProvider for Arc<T> {
    fn get_settings(&self) -> StoreResult<BTreeMap<String, String>> {
        (**self).get_settings()
    }
}

impl<T: StatsStore + ?Sized> StatsStore for Arc<T> {
    fn lookup_by_user(&self, user_id: &str) -> StoreResult<Vec<StatRecord>> {
        (**self).lookup_by_user(user_id)
    }

    fn lookup_by_name(&self, name: &str) -> StoreResult<Vec<StatRecord>> {
        (**self).lookup_by_name(name)
    }

    fn list_all(&self) -> StoreResult<Vec<StatRecord>> {
        (**self).list_all()
    }
}
