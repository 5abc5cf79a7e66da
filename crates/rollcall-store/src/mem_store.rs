use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::record::{SignupRecord, SignupStatus, StatRecord, parse_count};
use crate::{
    LedgerStore, RowPatch, SettingsProvider, StatsStore, StoreError, StoreResult,
};

/// Raw stored form of a ledger row. Count and status are kept as text to
/// mirror the sheet-like backing stores this trait abstracts; parsing
/// happens on read.
#[derive(Clone, Debug)]
struct RawRow {
    user_id: String,
    display_name: String,
    count: String,
    status: String,
    updated_ms: u64,
    note: Option<String>,
}

/// In-memory backend implementing all three store traits. Used by tests
/// and as the reference semantics for positional row addressing.
#[derive(Clone, Default)]
pub struct MemStore {
    rows: Arc<RwLock<Vec<RawRow>>>,
    settings: Arc<RwLock<BTreeMap<String, String>>>,
    stats: Arc<RwLock<Vec<StatRecord>>>,
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore")
            .field("rows", &self.rows.read().unwrap().len())
            .field("settings", &self.settings.read().unwrap().len())
            .field("stats", &self.stats.read().unwrap().len())
            .finish()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_setting(&self, key: &str, value: &str) {
        self.settings
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn add_stat(&self, record: StatRecord) {
        self.stats.write().unwrap().push(record);
    }

    /// Seeds a row with unparsed count/status text, as a legacy or
    /// hand-edited backing store could contain.
    pub fn append_raw(&self, user_id: &str, display_name: &str, count: &str, status: &str) {
        self.rows.write().unwrap().push(RawRow {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            count: count.to_string(),
            status: status.to_string(),
            updated_ms: 0,
            note: None,
        });
    }
}

impl LedgerStore for MemStore {
    fn list_rows(&self) -> StoreResult<Vec<SignupRecord>> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .map(|raw| SignupRecord {
                user_id: raw.user_id.clone(),
                display_name: raw.display_name.clone(),
                count: parse_count(&raw.count),
                status: SignupStatus::parse_lossy(&raw.status),
                updated_ms: raw.updated_ms,
                note: raw.note.clone(),
            })
            .collect())
    }

    fn append_row(&self, record: &SignupRecord) -> StoreResult<()> {
        self.rows.write().unwrap().push(RawRow {
            user_id: record.user_id.clone(),
            display_name: record.display_name.clone(),
            count: record.count.to_string(),
            status: record.status.as_str().to_string(),
            updated_ms: record.updated_ms,
            note: record.note.clone(),
        });
        Ok(())
    }

    fn update_field(&self, row: usize, patch: RowPatch) -> StoreResult<()> {
        let mut rows = self.rows.write().unwrap();
        let raw = rows.get_mut(row).ok_or(StoreError::RowOutOfRange(row))?;
        match patch {
            RowPatch::Count(count) => raw.count = count.to_string(),
            RowPatch::Status(status) => raw.status = status.as_str().to_string(),
            RowPatch::UpdatedMs(updated_ms) => raw.updated_ms = updated_ms,
            RowPatch::DisplayName(name) => raw.display_name = name,
        }
        Ok(())
    }

    fn delete_row(&self, row: usize) -> StoreResult<()> {
        let mut rows = self.rows.write().unwrap();
        if row >= rows.len() {
            return Err(StoreError::RowOutOfRange(row));
        }
        rows.remove(row);
        Ok(())
    }
}

impl SettingsProvider for MemStore {
    fn get_settings(&self) -> StoreResult<BTreeMap<String, String>> {
        Ok(self.settings.read().unwrap().clone())
    }
}

impl StatsStore for MemStore {
    fn lookup_by_user(&self, user_id: &str) -> StoreResult<Vec<StatRecord>> {
        let stats = self.stats.read().unwrap();
        Ok(stats.iter().filter(|s| s.user_id == user_id).cloned().collect())
    }

    fn lookup_by_name(&self, name: &str) -> StoreResult<Vec<StatRecord>> {
        let stats = self.stats.read().unwrap();
        Ok(stats.iter().filter(|s| s.name == name).cloned().collect())
    }

    fn list_all(&self) -> StoreResult<Vec<StatRecord>> {
        Ok(self.stats.read().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RowOp;

    fn record(user_id: &str, count: u32, status: SignupStatus) -> SignupRecord {
        SignupRecord {
            user_id: user_id.to_string(),
            display_name: user_id.to_uppercase(),
            count,
            status,
            updated_ms: 1,
            note: None,
        }
    }

    #[test]
    fn append_and_list_round_trip() {
        let store = MemStore::new();
        store.append_row(&record("a", 2, SignupStatus::Approved)).unwrap();
        store.append_row(&record("b", 1, SignupStatus::Waitlisted)).unwrap();

        let rows = store.list_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "a");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].status, SignupStatus::Waitlisted);
    }

    #[test]
    fn delete_shifts_later_positions() {
        let store = MemStore::new();
        store.append_row(&record("a", 1, SignupStatus::Approved)).unwrap();
        store.append_row(&record("b", 1, SignupStatus::Approved)).unwrap();
        store.append_row(&record("c", 1, SignupStatus::Approved)).unwrap();

        store.delete_row(0).unwrap();
        let rows = store.list_rows().unwrap();
        assert_eq!(rows[0].user_id, "b");
        assert_eq!(rows[1].user_id, "c");

        store.update_field(1, RowPatch::Count(9)).unwrap();
        assert_eq!(store.list_rows().unwrap()[1].count, 9);
    }

    #[test]
    fn out_of_range_row_is_an_error() {
        let store = MemStore::new();
        assert!(matches!(
            store.delete_row(0),
            Err(StoreError::RowOutOfRange(0))
        ));
        assert!(matches!(
            store.update_field(3, RowPatch::Count(1)),
            Err(StoreError::RowOutOfRange(3))
        ));
    }

    #[test]
    fn malformed_rows_parse_lossily() {
        let store = MemStore::new();
        store.append_raw("a", "A", "not-a-number", "approved");
        store.append_raw("b", "B", "2", "confirmed");

        let rows = store.list_rows().unwrap();
        assert_eq!(rows[0].count, 0);
        assert_eq!(rows[0].status, SignupStatus::Approved);
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[1].status, SignupStatus::Waitlisted);
    }

    #[test]
    fn apply_replays_a_plan_in_order() {
        let store = MemStore::new();
        store.append_row(&record("a", 1, SignupStatus::Approved)).unwrap();
        store.append_row(&record("a", 2, SignupStatus::Approved)).unwrap();
        store.append_row(&record("b", 3, SignupStatus::Waitlisted)).unwrap();

        // Delete the duplicate, bump the kept row, append a waitlist row.
        store
            .apply(&[
                RowOp::Delete(1),
                RowOp::Update {
                    row: 0,
                    count: 4,
                    updated_ms: 7,
                },
                RowOp::Append(record("a", 1, SignupStatus::Waitlisted)),
            ])
            .unwrap();

        let rows = store.list_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].count, 4);
        assert_eq!(rows[0].updated_ms, 7);
        assert_eq!(rows[1].user_id, "b");
        assert_eq!(rows[2].status, SignupStatus::Waitlisted);
    }
}
