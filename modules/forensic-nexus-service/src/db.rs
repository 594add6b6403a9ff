//! SQLite key-value backing store for indexed entity collections.
//!
//! Records are stored as JSON bodies keyed by `(entity, id)`. Each index keeps
//! an ordered list of ids (insertion order) so listing never scans record
//! bodies. A per-entity guard row records that seeding has been decided.

use crate::error::StoreError;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

/// One page of raw record bodies plus the index position of its last entry,
/// set only when more entries follow in the same direction.
#[derive(Debug)]
pub struct RawPage {
    pub bodies: Vec<String>,
    pub next_position: Option<i64>,
}

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS entity_records (
                entity TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                stored_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (entity, id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS entity_index (
                position INTEGER PRIMARY KEY AUTOINCREMENT,
                index_name TEXT NOT NULL,
                id TEXT NOT NULL,
                UNIQUE (index_name, id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS seed_guards (
                entity TEXT PRIMARY KEY,
                seeded_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert a new record and append it to the index. Existing ids are rejected.
    pub fn insert_record(
        &self,
        entity: &'static str,
        index: &str,
        id: &str,
        body: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        insert_row(&tx, entity, index, id, body).map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Duplicate {
                    entity,
                    id: id.to_string(),
                }
            } else {
                StoreError::Database(e)
            }
        })?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_record(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let body = conn
            .query_row(
                "SELECT body FROM entity_records WHERE entity = ?1 AND id = ?2",
                params![entity, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    }

    /// Read up to `limit` records in index order, starting after position `after`.
    pub fn page_records(
        &self,
        entity: &str,
        index: &str,
        after: i64,
        limit: usize,
    ) -> Result<RawPage, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT i.position, r.body
             FROM entity_index i
             JOIN entity_records r ON r.entity = ?1 AND r.id = i.id
             WHERE i.index_name = ?2 AND i.position > ?3
             ORDER BY i.position ASC
             LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(params![entity, index, after, fetch_size(limit)], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<(i64, String)>, _>>()?;
        Ok(into_page(rows, limit))
    }

    /// Read up to `limit` records in reverse index order (latest first),
    /// starting below position `before`, or at the newest entry when `None`.
    pub fn page_records_desc(
        &self,
        entity: &str,
        index: &str,
        before: Option<i64>,
        limit: usize,
    ) -> Result<RawPage, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT i.position, r.body
             FROM entity_index i
             JOIN entity_records r ON r.entity = ?1 AND r.id = i.id
             WHERE i.index_name = ?2 AND (?3 IS NULL OR i.position < ?3)
             ORDER BY i.position DESC
             LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(params![entity, index, before, fetch_size(limit)], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<(i64, String)>, _>>()?;
        Ok(into_page(rows, limit))
    }

    /// Remove a record and its index entry. Returns false if the id was absent.
    pub fn delete_record(&self, entity: &str, index: &str, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM entity_records WHERE entity = ?1 AND id = ?2",
            params![entity, id],
        )?;
        tx.execute(
            "DELETE FROM entity_index WHERE index_name = ?1 AND id = ?2",
            params![index, id],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn count_records(&self, entity: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entity_records WHERE entity = ?1",
            params![entity],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    /// Insert `rows` only if this entity was never seeded and holds no records.
    ///
    /// The guard check, emptiness check and inserts share one immediate
    /// transaction, so racing callers cannot both seed.
    pub fn seed_once(
        &self,
        entity: &'static str,
        index: &str,
        rows: &[(String, String)],
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let claimed = tx.execute(
            "INSERT OR IGNORE INTO seed_guards (entity) VALUES (?1)",
            params![entity],
        )?;
        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM entity_records WHERE entity = ?1",
            params![entity],
            |r| r.get(0),
        )?;

        if claimed == 0 || existing > 0 {
            tx.commit()?;
            return Ok(false);
        }

        for (id, body) in rows {
            insert_row(&tx, entity, index, id, body)?;
        }
        tx.commit()?;
        Ok(true)
    }
}

// One extra row tells us whether another page exists.
fn fetch_size(limit: usize) -> i64 {
    (limit as i64).saturating_add(1)
}

fn into_page(mut rows: Vec<(i64, String)>, limit: usize) -> RawPage {
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    let next_position = if has_more {
        rows.last().map(|(pos, _)| *pos)
    } else {
        None
    };
    RawPage {
        bodies: rows.into_iter().map(|(_, body)| body).collect(),
        next_position,
    }
}

fn insert_row(
    conn: &Connection,
    entity: &str,
    index: &str,
    id: &str,
    body: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO entity_records (entity, id, body) VALUES (?1, ?2, ?3)",
        params![entity, id, body],
    )?;
    conn.execute(
        "INSERT INTO entity_index (index_name, id) VALUES (?1, ?2)",
        params![index, id],
    )?;
    Ok(())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
