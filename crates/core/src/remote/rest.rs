use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::settings::RemoteSettings;
use super::traits::{Collection, Direction, Query, RemoteStore};

/// Hosted store reached through a PostgREST endpoint (e.g. a Supabase project).
///
/// - **Select**: `GET /rest/v1/{table}?select=*&{col}=eq.{value}&order={col}.{asc|desc}`
/// - **Upsert**: `POST /rest/v1/{table}` with `Prefer: resolution=merge-duplicates`
/// - **Delete**: `DELETE /rest/v1/{table}?{pk}=eq.{id}`
///
/// Every request carries the project key both as `apikey` and as a bearer token.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(settings: &RemoteSettings) -> Result<Self, CoreError> {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        Ok(Self {
            client: builder.build()?,
            base_url: format!("{}/rest/v1", settings.url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
        })
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection.table())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Map a non-2xx response to `CoreError::Remote`, keeping the body for diagnostics.
    async fn check(collection: Collection, resp: Response) -> Result<Response, CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CoreError::Remote {
            collection: collection.to_string(),
            message: format!("HTTP {status}: {body}"),
        })
    }
}

/// Build the PostgREST query-string pairs for a `Query`.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    if let Some((column, value)) = &query.filter {
        params.push((column.clone(), format!("eq.{value}")));
    }
    if let Some((column, direction)) = &query.order {
        let dir = match direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{column}.{dir}")));
    }
    params
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RemoteStore for RestStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn fetch_all(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, CoreError> {
        tracing::debug!(table = collection.table(), "remote select");
        let resp = self
            .authorize(self.client.get(self.table_url(collection)))
            .query(&query_params(query))
            .send()
            .await?;
        let resp = Self::check(collection, resp).await?;

        resp.json::<Vec<Value>>().await.map_err(|e| CoreError::Remote {
            collection: collection.to_string(),
            message: format!("Failed to parse select response: {e}"),
        })
    }

    async fn upsert(&self, collection: Collection, records: Vec<Value>) -> Result<(), CoreError> {
        if records.is_empty() {
            return Ok(());
        }
        tracing::debug!(table = collection.table(), count = records.len(), "remote upsert");
        let resp = self
            .authorize(self.client.post(self.table_url(collection)))
            .query(&[("on_conflict", collection.primary_key())])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&records)
            .send()
            .await?;
        Self::check(collection, resp).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        tracing::debug!(table = collection.table(), "remote delete");
        let resp = self
            .authorize(self.client.delete(self.table_url(collection)))
            .query(&[(collection.primary_key(), format!("eq.{id}"))])
            .send()
            .await?;
        Self::check(collection, resp).await?;
        Ok(())
    }
}
