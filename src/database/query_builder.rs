use serde_json::Value;
use sqlx::{postgres::PgArguments, PgConnection, PgPool, Postgres, Row};

use crate::database::entity::Entity;
use crate::database::manager::DatabaseError;
use crate::database::repository::Page;
use crate::filter::{Filter, FilterData, SqlResult};

/// Builds and runs SELECT statements for one entity table
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> QueryBuilder<T> {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(T::TABLE)?,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Restrict by filter document, order by key, and apply the page window
    pub fn filter(mut self, where_clause: Option<Value>, page: Page) -> Result<Self, DatabaseError> {
        self.filter.assign(FilterData {
            where_clause,
            order: Some(Value::String(T::KEY.to_string())),
            limit: page.take(),
            offset: page.take().map(|_| page.skip()),
        })?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional(mut self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        self.filter.limit(1, None)?;
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let SqlResult { query, params } = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&query);
        for p in params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    /// DELETE the filtered rows on an open connection (usually a transaction)
    pub async fn delete(self, conn: &mut PgConnection) -> Result<u64, DatabaseError> {
        let SqlResult { query, params } = self.filter.to_where_sql()?;
        let sql = format!("DELETE FROM \"{}\" WHERE {}", T::TABLE, query);
        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_param_query(q, p);
        }
        Ok(q.execute(conn).await?.rows_affected())
    }
}

pub(crate) fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Arrays and objects are bound as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(sqlx::types::Json(v)),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(sqlx::types::Json(v)),
    }
}
