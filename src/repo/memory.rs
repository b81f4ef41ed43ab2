//! In-memory repository used by tests in place of Postgres.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{Columns, Entity, FieldValue, Patch, Record, RepoError, Repository};

/// Emulates server-assigned ids and timestamps and the table's unique constraints.
pub struct MemoryRepository<E: Entity> {
    rows: Arc<RwLock<BTreeMap<i64, E::Record>>>,
    next_id: Arc<AtomicI64>,
}

impl<E: Entity> Clone for MemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row, ordered by id.
    pub async fn records(&self) -> Vec<E::Record> {
        self.rows.read().await.values().cloned().collect()
    }

    fn check_unique(
        rows: &BTreeMap<i64, E::Record>,
        candidate: &E::Record,
    ) -> Result<(), RepoError> {
        for group in E::Record::UNIQUE {
            let clash = rows.values().any(|row| {
                row.id() != candidate.id()
                    && group.iter().all(|c| row.value(c) == candidate.value(c))
            });
            if clash {
                return Err(RepoError::Conflict(group.join(",")));
            }
        }
        Ok(())
    }
}

fn overlay(mut base: Columns, changes: Columns) -> Columns {
    for (name, value) in changes {
        match base.iter_mut().find(|(c, _)| *c == name) {
            Some(slot) => slot.1 = value,
            None => base.push((name, value)),
        }
    }
    base
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn get(&self, id: i64) -> Result<Option<E>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned().map(E::from))
    }

    async fn create(&self, new: &E::New) -> Result<E, RepoError> {
        let mut columns = E::insert_columns(new);
        if E::Record::TIMESTAMPS {
            let now = OffsetDateTime::now_utc();
            columns = overlay(
                columns,
                vec![
                    ("created_at", FieldValue::Timestamp(now)),
                    ("updated_at", FieldValue::Timestamp(now)),
                ],
            );
        }

        let mut rows = self.rows.write().await;
        let id = self.next_id.load(Ordering::SeqCst);
        let record = E::Record::from_columns(id, &columns)?;
        Self::check_unique(&rows, &record)?;
        self.next_id.fetch_add(1, Ordering::SeqCst);
        rows.insert(id, record.clone());
        Ok(E::from(record))
    }

    async fn update(&self, id: i64, patch: Patch) -> Result<Option<E>, RepoError> {
        for (name, _) in patch.columns() {
            if !E::Record::has_column(name) {
                return Err(RepoError::UnknownField(name.to_string()));
            }
        }

        let mut rows = self.rows.write().await;
        let Some(current) = rows.get(&id) else {
            return Ok(None);
        };
        let mut changes = patch.into_columns();
        if E::Record::TIMESTAMPS {
            changes.push(("updated_at", FieldValue::Timestamp(OffsetDateTime::now_utc())));
        }
        let record = E::Record::from_columns(id, &overlay(current.columns(), changes))?;
        Self::check_unique(&rows, &record)?;
        rows.insert(id, record.clone());
        Ok(Some(E::from(record)))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn get_by_field(
        &self,
        field: &str,
        value: FieldValue,
        single: bool,
    ) -> Result<Vec<E>, RepoError> {
        if !E::Record::has_column(field) {
            return Err(RepoError::UnknownField(field.to_string()));
        }
        let rows = self.rows.read().await;
        let matches = rows
            .values()
            .filter(|row| row.value(field).as_ref() == Some(&value))
            .take(if single { 1 } else { usize::MAX })
            .cloned()
            .map(E::from)
            .collect();
        Ok(matches)
    }
}
