//! Generic indexed entity collections over the key-value backing store.

use crate::db::{Db, RawPage};
use crate::error::StoreError;
use forensic_nexus_types::Page;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

pub const MAX_PAGE_SIZE: usize = 100;

/// A record type that lives in its own keyed collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Key namespace for records of this type
    const ENTITY_NAME: &'static str;
    /// Name of the ordered id list used for listing
    const INDEX_NAME: &'static str;

    fn id(&self) -> &str;

    /// Records inserted by the first `ensure_seed` on an empty collection.
    fn seed_data() -> Vec<Self>;
}

/// Create/read/list/delete access to one entity collection.
///
/// Holds only a shared `Db` handle, so instances are cheap to build per request.
pub struct IndexedEntity<T: Entity> {
    db: Arc<Db>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for IndexedEntity<T> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<T: Entity> IndexedEntity<T> {
    pub fn new(db: Arc<Db>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// Store a new record. Fails with `Duplicate` if the id is taken.
    pub fn create(&self, record: T) -> Result<T, StoreError> {
        let body = serde_json::to_string(&record)?;
        self.db
            .insert_record(T::ENTITY_NAME, T::INDEX_NAME, record.id(), &body)?;
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<T, StoreError> {
        match self.db.get_record(T::ENTITY_NAME, id)? {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Err(StoreError::NotFound {
                entity: T::ENTITY_NAME,
                id: id.to_string(),
            }),
        }
    }

    /// One page in index order. `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn list(&self, cursor: Option<&str>, page_size: usize) -> Result<Page<T>, StoreError> {
        let after = parse_cursor(cursor)?.unwrap_or(0);
        let raw = self
            .db
            .page_records(T::ENTITY_NAME, T::INDEX_NAME, after, clamp_page_size(page_size))?;
        into_page(raw)
    }

    /// One page in reverse index order, so the first page holds the most
    /// recently created records.
    pub fn list_latest_first(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<T>, StoreError> {
        let before = parse_cursor(cursor)?;
        let raw = self.db.page_records_desc(
            T::ENTITY_NAME,
            T::INDEX_NAME,
            before,
            clamp_page_size(page_size),
        )?;
        into_page(raw)
    }

    /// Every record in index order, following cursors until exhausted.
    pub fn list_all(&self) -> Result<Vec<T>, StoreError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list(cursor.as_deref(), MAX_PAGE_SIZE)?;
            all.extend(page.items);
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(all),
            }
        }
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        if self.db.delete_record(T::ENTITY_NAME, T::INDEX_NAME, id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: T::ENTITY_NAME,
                id: id.to_string(),
            })
        }
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        self.db.count_records(T::ENTITY_NAME)
    }

    /// Insert `T::seed_data()` once, and only into an empty collection.
    /// Returns true if this call performed the seeding.
    pub fn ensure_seed(&self) -> Result<bool, StoreError> {
        let rows = T::seed_data()
            .iter()
            .map(|record| -> Result<(String, String), StoreError> {
                Ok((record.id().to_string(), serde_json::to_string(record)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let seeded = self.db.seed_once(T::ENTITY_NAME, T::INDEX_NAME, &rows)?;
        if seeded {
            log::info!("Seeded {} {} records", rows.len(), T::ENTITY_NAME);
        }
        Ok(seeded)
    }
}

fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Cursors are index positions. Absent or empty means "from the start".
fn parse_cursor(cursor: Option<&str>) -> Result<Option<i64>, StoreError> {
    match cursor {
        None => Ok(None),
        Some("") => Ok(None),
        Some(c) => c
            .parse::<i64>()
            .ok()
            .filter(|pos| *pos >= 0)
            .map(Some)
            .ok_or_else(|| StoreError::InvalidCursor(c.to_string())),
    }
}

fn into_page<T: Entity>(raw: RawPage) -> Result<Page<T>, StoreError> {
    let items = raw
        .bodies
        .iter()
        .map(|body| serde_json::from_str(body))
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page {
        items,
        cursor: raw.next_position.map(|pos| pos.to_string()),
    })
}
