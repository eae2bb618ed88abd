use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::entity::Entity;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Page, Repository};
use crate::filter::FilterWhere;

struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_key: i32,
}

/// In-process repository used by tests and `DATABASE_BACKEND=memory`.
///
/// Rows are kept in key order and filtered with [`FilterWhere::matches`], so
/// results line up with what the Postgres repository returns.
pub struct MemoryRepository<T> {
    table: RwLock<Table<T>>,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_key: 1,
            }),
        }
    }

    fn matching<'a>(
        rows: &'a BTreeMap<i32, T>,
        filter: &'a Option<Value>,
    ) -> impl Iterator<Item = Result<&'a T, DatabaseError>> + 'a {
        rows.values().filter_map(move |row| {
            let Some(filter) = filter else {
                return Some(Ok(row));
            };
            let document = match serde_json::to_value(row) {
                Ok(document) => document,
                Err(e) => return Some(Err(e.into())),
            };
            match FilterWhere::matches(filter, &document) {
                Ok(true) => Some(Ok(row)),
                Ok(false) => None,
                Err(e) => Some(Err(e.into())),
            }
        })
    }

    /// Conflict when another row already holds one of the entity's unique values
    fn check_unique(rows: &BTreeMap<i32, T>, entity: &T) -> Result<(), DatabaseError> {
        if T::UNIQUE.is_empty() {
            return Ok(());
        }
        let document = serde_json::to_value(entity)?;
        for row in rows.values().filter(|row| row.key() != entity.key()) {
            let existing = serde_json::to_value(row)?;
            for column in T::UNIQUE {
                if document.get(*column).is_some() && document.get(*column) == existing.get(*column) {
                    return Err(DatabaseError::Conflict(format!(
                        "{} {} already exists",
                        T::TABLE,
                        column
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn get_all(&self, filter: Option<Value>, page: Page) -> Result<Vec<T>, DatabaseError> {
        let table = self.table.read().await;
        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let take = page
            .take()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Self::matching(&table.rows, &filter)
            .skip(skip)
            .take(take)
            .map(|row| row.cloned())
            .collect()
    }

    async fn get(&self, filter: Option<Value>) -> Result<Option<T>, DatabaseError> {
        let table = self.table.read().await;
        let first = Self::matching(&table.rows, &filter).next().transpose()?.cloned();
        Ok(first)
    }

    async fn count(&self, filter: Option<Value>) -> Result<i64, DatabaseError> {
        let table = self.table.read().await;
        let mut count = 0;
        for row in Self::matching(&table.rows, &filter) {
            row?;
            count += 1;
        }
        Ok(count)
    }

    async fn create(&self, mut entity: T) -> Result<T, DatabaseError> {
        let mut table = self.table.write().await;
        if T::GENERATED_KEY {
            let key = table.next_key;
            entity.set_key(key);
        } else if table.rows.contains_key(&entity.key()) {
            return Err(DatabaseError::Conflict(format!(
                "{} {} already exists",
                T::TABLE,
                entity.key()
            )));
        }

        Self::check_unique(&table.rows, &entity)?;

        let key = entity.key();
        table.next_key = table.next_key.max(key.saturating_add(1));
        table.rows.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, mut entity: T) -> Result<T, DatabaseError> {
        let mut table = self.table.write().await;
        let key = entity.key();
        if table.rows.contains_key(&key) {
            Self::check_unique(&table.rows, &entity)?;
        }
        match table.rows.get_mut(&key) {
            Some(row) => {
                entity.touch();
                *row = entity.clone();
                Ok(entity)
            }
            None => Err(DatabaseError::NotFound(format!("{} {} not found", T::TABLE, key))),
        }
    }

    async fn remove(&self, entity: &T) -> Result<(), DatabaseError> {
        let mut table = self.table.write().await;
        let key = entity.key();
        table
            .rows
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, key)))
    }

    async fn remove_all(&self, filter: Value) -> Result<u64, DatabaseError> {
        let mut table = self.table.write().await;
        let filter = Some(filter);
        let keys = Self::matching(&table.rows, &filter)
            .map(|row| row.map(|r| r.key()))
            .collect::<Result<Vec<_>, _>>()?;

        for key in &keys {
            table.rows.remove(key);
        }
        Ok(keys.len() as u64)
    }
}
