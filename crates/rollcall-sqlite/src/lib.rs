//! Durable signup storage backed by SQLite.
//!
//! Implements the same positional row semantics as the in-memory backend:
//! rows are addressed by their zero-based position in `pos` order, and a
//! delete shifts every later position. Unlike the spreadsheet-style stores
//! this design descends from, [`SqliteStore`] overrides
//! [`LedgerStore::apply`] to run a whole reconcile plan inside one real
//! transaction.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};

use rollcall_store::{
    LedgerStore, RowOp, RowPatch, SettingsProvider, SignupRecord, SignupStatus, StatRecord,
    StatsStore, StoreError, StoreResult, parse_count,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS signups (
    pos INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    display_name TEXT NOT NULL,
    count TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_ms INTEGER NOT NULL,
    note TEXT
);
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS stats (
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL
);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("sqlite connection lock poisoned".into()))
    }

    pub fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(backend)?;
        Ok(())
    }

    pub fn add_stat(&self, record: &StatRecord) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO stats (user_id, name, description) VALUES (?1, ?2, ?3)",
            params![record.user_id, record.name, record.description],
        )
        .map_err(backend)?;
        Ok(())
    }
}

/// Resolves a zero-based row position to its `pos` key.
fn pos_at(conn: &Connection, row: usize) -> StoreResult<i64> {
    conn.query_row(
        "SELECT pos FROM signups ORDER BY pos LIMIT 1 OFFSET ?1",
        params![row as i64],
        |r| r.get(0),
    )
    .optional()
    .map_err(backend)?
    .ok_or(StoreError::RowOutOfRange(row))
}

fn list_rows_on(conn: &Connection) -> StoreResult<Vec<SignupRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, display_name, count, status, updated_ms, note
             FROM signups ORDER BY pos",
        )
        .map_err(backend)?;
    let rows = stmt
        .query_map([], |r| {
            let count: String = r.get(2)?;
            let status: String = r.get(3)?;
            Ok(SignupRecord {
                user_id: r.get(0)?,
                display_name: r.get(1)?,
                count: parse_count(&count),
                status: SignupStatus::parse_lossy(&status),
                updated_ms: r.get::<_, i64>(4)? as u64,
                note: r.get(5)?,
            })
        })
        .map_err(backend)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(backend)?;
    Ok(rows)
}

fn append_row_on(conn: &Connection, record: &SignupRecord) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO signups (user_id, display_name, count, status, updated_ms, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.user_id,
            record.display_name,
            record.count.to_string(),
            record.status.as_str(),
            record.updated_ms as i64,
            record.note,
        ],
    )
    .map_err(backend)?;
    Ok(())
}

fn update_field_on(conn: &Connection, row: usize, patch: &RowPatch) -> StoreResult<()> {
    let pos = pos_at(conn, row)?;
    let changed = match patch {
        RowPatch::Count(count) => conn.execute(
            "UPDATE signups SET count = ?1 WHERE pos = ?2",
            params![count.to_string(), pos],
        ),
        RowPatch::Status(status) => conn.execute(
            "UPDATE signups SET status = ?1 WHERE pos = ?2",
            params![status.as_str(), pos],
        ),
        RowPatch::UpdatedMs(updated_ms) => conn.execute(
            "UPDATE signups SET updated_ms = ?1 WHERE pos = ?2",
            params![*updated_ms as i64, pos],
        ),
        RowPatch::DisplayName(name) => conn.execute(
            "UPDATE signups SET display_name = ?1 WHERE pos = ?2",
            params![name, pos],
        ),
    }
    .map_err(backend)?;
    debug_assert_eq!(changed, 1);
    Ok(())
}

fn delete_row_on(conn: &Connection, row: usize) -> StoreResult<()> {
    let pos = pos_at(conn, row)?;
    conn.execute("DELETE FROM signups WHERE pos = ?1", params![pos])
        .map_err(backend)?;
    Ok(())
}

impl LedgerStore for SqliteStore {
    fn list_rows(&self) -> StoreResult<Vec<SignupRecord>> {
        list_rows_on(&*self.lock()?)
    }

    fn append_row(&self, record: &SignupRecord) -> StoreResult<()> {
        append_row_on(&*self.lock()?, record)
    }

    fn update_field(&self, row: usize, patch: RowPatch) -> StoreResult<()> {
        update_field_on(&*self.lock()?, row, &patch)
    }

    fn delete_row(&self, row: usize) -> StoreResult<()> {
        delete_row_on(&*self.lock()?, row)
    }

    /// Runs the whole plan in one transaction: either every op lands or
    /// none does.
    fn apply(&self, ops: &[RowOp]) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(backend)?;
        for op in ops {
            match op {
                RowOp::Delete(row) => delete_row_on(&tx, *row)?,
                RowOp::Update {
                    row,
                    count,
                    updated_ms,
                } => {
                    update_field_on(&tx, *row, &RowPatch::Count(*count))?;
                    update_field_on(&tx, *row, &RowPatch::UpdatedMs(*updated_ms))?;
                }
                RowOp::Append(record) => append_row_on(&tx, record)?,
            }
        }
        tx.commit().map_err(backend)
    }
}

impl SettingsProvider for SqliteStore {
    fn get_settings(&self) -> StoreResult<BTreeMap<String, String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM settings")
            .map_err(backend)?;
        let map = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
            .map_err(backend)?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(backend)?;
        Ok(map)
    }
}

impl StatsStore for SqliteStore {
    fn lookup_by_user(&self, user_id: &str) -> StoreResult<Vec<StatRecord>> {
        self.query_stats(
            "SELECT user_id, name, description FROM stats WHERE user_id = ?1",
            user_id,
        )
    }

    fn lookup_by_name(&self, name: &str) -> StoreResult<Vec<StatRecord>> {
        self.query_stats(
            "SELECT user_id, name, description FROM stats WHERE name = ?1",
            name,
        )
    }

    fn list_all(&self) -> StoreResult<Vec<StatRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT user_id, name, description FROM stats")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], stat_from_row)
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(rows)
    }
}

impl SqliteStore {
    fn query_stats(&self, sql: &str, key: &str) -> StoreResult<Vec<StatRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(backend)?;
        let rows = stmt
            .query_map(params![key], stat_from_row)
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(rows)
    }
}

fn stat_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<StatRecord> {
    Ok(StatRecord {
        user_id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.append_row(&record("a", 2, SignupStatus::Approved)).unwrap();
            store.set_setting("capacity", "5").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let rows = store.list_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        assert_eq!(store.get_settings().unwrap()["capacity"], "5");
    }

    #[test]
    fn delete_shifts_later_positions() {
        let store = SqliteStore::open_in_memory().unwrap();
        for id in ["a", "b", "c"] {
            store.append_row(&record(id, 1, SignupStatus::Approved)).unwrap();
        }
        store.delete_row(1).unwrap();
        let rows = store.list_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "a");
        assert_eq!(rows[1].user_id, "c");
        store.update_field(1, RowPatch::Count(8)).unwrap();
        assert_eq!(store.list_rows().unwrap()[1].count, 8);
    }

    #[test]
    fn apply_is_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append_row(&record("a", 1, SignupStatus::Approved)).unwrap();

        // Second op is out of range; the append before it must not land.
        let err = store.apply(&[
            RowOp::Append(record("b", 2, SignupStatus::Waitlisted)),
            RowOp::Delete(9),
        ]);
        assert!(matches!(err, Err(StoreError::RowOutOfRange(9))));

        let rows = store.list_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "a");
    }

    #[test]
    fn stats_lookups_filter_exactly() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .add_stat(&StatRecord {
                user_id: "u1".into(),
                name: "Alice".into(),
                description: "won twice".into(),
            })
            .unwrap();
        store
            .add_stat(&StatRecord {
                user_id: "u2".into(),
                name: "Bob".into(),
                description: "new".into(),
            })
            .unwrap();

        assert_eq!(store.lookup_by_user("u1").unwrap().len(), 1);
        assert_eq!(store.lookup_by_name("Bob").unwrap()[0].description, "new");
        assert!(store.lookup_by_name("Ali").unwrap().is_empty());
        assert_eq!(store.list_all().unwrap().len(), 2);
    }
}
