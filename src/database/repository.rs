use async_trait::async_trait;
use serde_json::Value;

use crate::database::entity::{key_filter, Entity};
use crate::database::manager::DatabaseError;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Skip/take pagination. A size of zero disables paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    size: i64,
    number: i64,
}

impl Page {
    /// Sizes above [`MAX_PAGE_SIZE`] are capped, negative sizes disable paging
    /// and page numbers below 1 mean the first page.
    pub fn new(size: i64, number: i64) -> Self {
        Self {
            size: size.clamp(0, MAX_PAGE_SIZE),
            number: number.max(1),
        }
    }

    pub fn all() -> Self {
        Self { size: 0, number: 1 }
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn is_paged(&self) -> bool {
        self.size > 0
    }

    pub fn skip(&self) -> i64 {
        if self.is_paged() {
            self.size.saturating_mul(self.number - 1)
        } else {
            0
        }
    }

    pub fn take(&self) -> Option<i64> {
        self.is_paged().then_some(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}

/// Generic data access over one entity type.
///
/// Filters are JSON documents understood by [`crate::filter::FilterWhere`].
/// Results are ordered by the entity key. Each write is its own unit of work
/// and is saved before the call returns.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn get_all(&self, filter: Option<Value>, page: Page) -> Result<Vec<T>, DatabaseError>;

    /// First match in key order
    async fn get(&self, filter: Option<Value>) -> Result<Option<T>, DatabaseError>;

    async fn count(&self, filter: Option<Value>) -> Result<i64, DatabaseError>;

    /// Insert, returning the stored row (with its generated key)
    async fn create(&self, entity: T) -> Result<T, DatabaseError>;

    /// Replace the row with the same key. `NotFound` when there is none.
    async fn update(&self, entity: T) -> Result<T, DatabaseError>;

    async fn remove(&self, entity: &T) -> Result<(), DatabaseError>;

    /// Delete every row matching `filter` in one unit of work, returning how many went
    async fn remove_all(&self, filter: Value) -> Result<u64, DatabaseError>;

    async fn get_by_key(&self, key: i32) -> Result<Option<T>, DatabaseError> {
        self.get(Some(key_filter::<T>(key))).await
    }
}
