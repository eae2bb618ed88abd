use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, FromRow};

/// A row type stored in a single table.
///
/// Field names serialize to the table's column names; the repositories rely on
/// that to build filters and inserts from `serde_json` documents.
pub trait Entity:
    Clone + Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    const KEY: &'static str;
    /// Whether the store assigns the key on insert (SERIAL) or the caller provides it
    const GENERATED_KEY: bool;
    /// Columns besides the key that no two rows may share
    const UNIQUE: &'static [&'static str] = &[];

    fn key(&self) -> i32;
    fn set_key(&mut self, key: i32);

    /// Stamp modification metadata before an update is written
    fn touch(&mut self) {}
}

/// Filter document selecting one entity by key
pub fn key_filter<T: Entity>(key: i32) -> Value {
    let mut map = Map::new();
    map.insert(T::KEY.to_string(), Value::from(key));
    Value::Object(map)
}

/// Serialize an entity into a column → value document
pub fn to_document<T: Entity>(entity: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "entity for table {} serialized to {}, expected an object",
            T::TABLE,
            other
        ))),
    }
}
