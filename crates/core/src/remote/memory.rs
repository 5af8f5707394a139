use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::errors::CoreError;
use super::traits::{Collection, Direction, Query, RemoteStore};

const ALL_COLLECTIONS: [Collection; 3] = [
    Collection::Users,
    Collection::Transactions,
    Collection::Advertisements,
];

/// In-process store with the same select/upsert/delete semantics as the
/// hosted one. Used when no remote is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.lock()
            .map(|t| t.get(&collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Direct lookup by primary key.
    pub fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        self.lock()
            .ok()?
            .get(&collection)
            .and_then(|rows| rows.get(id).cloned())
    }

    /// Dump every table as `{ "<table>": [records...] }`.
    pub fn snapshot(&self) -> Result<Value, CoreError> {
        let tables = self.lock()?;
        let mut out = serde_json::Map::new();
        for collection in ALL_COLLECTIONS {
            let rows: Vec<Value> = tables
                .get(&collection)
                .map(|rows| rows.values().cloned().collect())
                .unwrap_or_default();
            out.insert(collection.table().to_string(), Value::Array(rows));
        }
        Ok(Value::Object(out))
    }

    /// Rebuild a store from a [`snapshot`](Self::snapshot). Unknown tables are ignored.
    pub fn from_snapshot(snapshot: &Value) -> Result<Self, CoreError> {
        let mut tables = HashMap::new();
        for collection in ALL_COLLECTIONS {
            let Some(rows) = snapshot.get(collection.table()).and_then(Value::as_array) else {
                continue;
            };
            let key = collection.primary_key();
            let mut table = BTreeMap::new();
            for row in rows {
                let id = row.get(key).and_then(as_text).ok_or_else(|| {
                    CoreError::Deserialization(format!(
                        "snapshot record in '{collection}' is missing '{key}'"
                    ))
                })?;
                table.insert(id, row.clone());
            }
            tables.insert(collection, table);
        }
        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Collection, BTreeMap<String, Value>>>, CoreError> {
        self.tables.lock().map_err(|_| CoreError::Remote {
            collection: "memory".into(),
            message: "store lock poisoned".into(),
        })
    }
}

/// Render a JSON scalar the way a query-string filter would compare it.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_all(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, CoreError> {
        let tables = self.lock()?;
        let mut rows: Vec<Value> = tables
            .get(&collection)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();

        if let Some((column, expected)) = &query.filter {
            rows.retain(|row| row.get(column).and_then(as_text).as_deref() == Some(expected.as_str()));
        }

        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ka = a.get(column).and_then(as_text).unwrap_or_default();
                let kb = b.get(column).and_then(as_text).unwrap_or_default();
                match direction {
                    Direction::Ascending => ka.cmp(&kb),
                    Direction::Descending => kb.cmp(&ka),
                }
            });
        }

        Ok(rows)
    }

    async fn upsert(&self, collection: Collection, records: Vec<Value>) -> Result<(), CoreError> {
        let key = collection.primary_key();
        // Validate the whole batch before touching the table
        let mut keyed = Vec::with_capacity(records.len());
        for record in records {
            let id = record.get(key).and_then(as_text).ok_or_else(|| CoreError::Remote {
                collection: collection.to_string(),
                message: format!("record is missing primary key '{key}'"),
            })?;
            keyed.push((id, record));
        }

        let mut tables = self.lock()?;
        let table = tables.entry(collection).or_default();
        for (id, record) in keyed {
            table.insert(id, record);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        if let Some(table) = tables.get_mut(&collection) {
            table.remove(id);
        }
        Ok(())
    }
}
