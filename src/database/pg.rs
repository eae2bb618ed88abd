use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::entity::{to_document, Entity};
use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::{Page, Repository};
use crate::filter::is_identifier;

/// Postgres-backed repository for one entity table
pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    /// Quoted column list for the entity's document, checked for safe names
    fn columns(document: &serde_json::Map<String, Value>) -> Result<String, DatabaseError> {
        let mut columns = Vec::with_capacity(document.len());
        for name in document.keys() {
            if !is_identifier(name) {
                return Err(DatabaseError::QueryError(format!("Invalid column name: {}", name)));
            }
            columns.push(format!("\"{}\"", name));
        }
        Ok(columns.join(", "))
    }

    async fn save(tx: Transaction<'_, Postgres>) -> Result<(), DatabaseError> {
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for PgRepository<T> {
    async fn get_all(&self, filter: Option<Value>, page: Page) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new()?.filter(filter, page)?.select_all(&self.pool).await
    }

    async fn get(&self, filter: Option<Value>) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new()?
            .filter(filter, Page::all())?
            .select_optional(&self.pool)
            .await
    }

    async fn count(&self, filter: Option<Value>) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new()?.filter(filter, Page::all())?.count(&self.pool).await
    }

    async fn create(&self, entity: T) -> Result<T, DatabaseError> {
        let mut document = to_document(&entity)?;
        if T::GENERATED_KEY {
            document.remove(T::KEY);
        }
        let columns = Self::columns(&document)?;
        let query = format!(
            "INSERT INTO \"{table}\" ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1) RETURNING *",
            table = T::TABLE,
            columns = columns,
        );
        debug!("create {}: {}", T::TABLE, query);

        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, T>(&query)
            .bind(sqlx::types::Json(Value::Object(document)))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DatabaseError::Conflict(format!("{} already exists: {}", T::TABLE, db.message()))
                }
                other => DatabaseError::Sqlx(other),
            })?;
        Self::save(tx).await?;
        Ok(created)
    }

    async fn update(&self, mut entity: T) -> Result<T, DatabaseError> {
        entity.touch();
        let key = entity.key();
        let mut document = to_document(&entity)?;
        document.remove(T::KEY);
        let columns = Self::columns(&document)?;
        let query = format!(
            "UPDATE \"{table}\" SET ({columns}) = (SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1)) WHERE \"{key}\" = $2 RETURNING *",
            table = T::TABLE,
            columns = columns,
            key = T::KEY,
        );
        debug!("update {} {}: {}", T::TABLE, key, query);

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, T>(&query)
            .bind(sqlx::types::Json(Value::Object(document)))
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, key)))?;
        Self::save(tx).await?;
        Ok(updated)
    }

    async fn remove(&self, entity: &T) -> Result<(), DatabaseError> {
        let key = entity.key();
        let query = format!("DELETE FROM \"{}\" WHERE \"{}\" = $1", T::TABLE, T::KEY);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&query).bind(key).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {} not found", T::TABLE, key)));
        }
        Self::save(tx).await?;
        Ok(())
    }

    async fn remove_all(&self, filter: Value) -> Result<u64, DatabaseError> {
        let builder = QueryBuilder::<T>::new()?.filter(Some(filter), Page::all())?;

        let mut tx = self.pool.begin().await?;
        let removed = builder.delete(&mut tx).await?;
        Self::save(tx).await?;
        debug!("removed {} rows from {}", removed, T::TABLE);
        Ok(removed)
    }
}
