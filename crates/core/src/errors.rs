use thiserror::Error;

/// Unified error type for the entire pocket-ledger-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local cache ─────────────────────────────────────────────────
    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Remote store / Network ──────────────────────────────────────
    #[error("Remote store error ({collection}): {message}")]
    Remote {
        collection: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Session ─────────────────────────────────────────────────────
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Operation requires the {0} role")]
    Forbidden(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Migration stopped after {migrated} record(s), {remaining} left: {message}")]
    MigrationIncomplete {
        migrated: usize,
        remaining: usize,
        message: String,
    },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; filter values can hold
        // identifiers and emails, so drop the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
