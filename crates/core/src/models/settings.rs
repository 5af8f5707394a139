use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const ENV_REMOTE_URL: &str = "POCKET_LEDGER_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "POCKET_LEDGER_REMOTE_KEY";
pub const ENV_TIMEOUT_SECS: &str = "POCKET_LEDGER_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the hosted store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public (anon) API key sent as `apikey` and bearer token
    pub api_key: String,

    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl RemoteSettings {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read settings from the environment.
    /// Returns `Ok(None)` when no remote URL is configured.
    pub fn from_env() -> Result<Option<Self>, CoreError> {
        let url = match std::env::var(ENV_REMOTE_URL) {
            Ok(u) if !u.trim().is_empty() => u.trim().trim_end_matches('/').to_string(),
            _ => return Ok(None),
        };
        let api_key = std::env::var(ENV_REMOTE_KEY).map_err(|_| {
            CoreError::ValidationError(format!("{ENV_REMOTE_URL} is set but {ENV_REMOTE_KEY} is missing"))
        })?;
        let timeout_secs = std::env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Some(Self {
            url,
            api_key,
            timeout_secs,
        }))
    }
}
