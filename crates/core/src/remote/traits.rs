use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;

/// Remote tables the tracker reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Transactions,
    Advertisements,
}

impl Collection {
    /// Table name on the remote side.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Transactions => "transactions",
            Collection::Advertisements => "advertisements",
        }
    }

    /// Column that upserts and deletes are keyed on.
    pub fn primary_key(&self) -> &'static str {
        match self {
            Collection::Users => "email",
            Collection::Transactions | Collection::Advertisements => "id",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Select options: an optional equality filter and an optional ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: Option<(String, String)>,
    pub order: Option<(String, Direction)>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }
}

/// Narrow contract of the hosted store: select, upsert, delete.
///
/// Records travel as JSON objects so the store stays agnostic of the
/// domain types; decoding happens in the gateway.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RemoteStore: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// Select every record matching `query`.
    async fn fetch_all(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, CoreError>;

    /// Insert-or-replace each record, keyed by the collection's primary key.
    async fn upsert(&self, collection: Collection, records: Vec<Value>) -> Result<(), CoreError>;

    /// Delete by primary key. Deleting an absent id succeeds.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), CoreError>;
}
