use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::advertisement::Advertisement;
use crate::models::transaction::Transaction;
use crate::models::user::UserProfile;

use super::backend::{KeyValueStore, MemoryKeyValueStore};

/// Serialized profile of the signed-in user.
pub const SESSION_KEY: &str = "W_SESSION";
/// Fallback copy of the remote `users` table.
pub const USERS_KEY: &str = "GLOBAL_WARRICK_USERS";
/// Fallback copy of the remote `advertisements` table.
pub const ADS_KEY: &str = "GLOBAL_WARRICK_ADS";
/// Prefix of the pre-remote per-user transaction lists (migration source only).
pub const LEGACY_TX_PREFIX: &str = "GLOBAL_TX_";
/// Prefix of the per-user transaction mirror.
pub const MIRROR_TX_PREFIX: &str = "W_TX_";

pub fn legacy_tx_key(user_id: &str) -> String {
    format!("{LEGACY_TX_PREFIX}{user_id}")
}

pub fn mirror_tx_key(user_id: &str) -> String {
    format!("{MIRROR_TX_PREFIX}{user_id}")
}

/// Typed view over the local key space.
///
/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct LocalCache {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("keys", &self.backend.keys().map(|k| k.len()).unwrap_or(0))
            .finish()
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl LocalCache {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    /// Read and decode a key. `Ok(None)` when absent, `Err` when malformed.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        match self.backend.get(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                CoreError::Deserialization(format!("Malformed local value under '{key}': {e}"))
            }),
        }
    }

    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize '{key}': {e}")))?;
        self.backend.set(key, json)
    }

    pub fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.backend.remove(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool, CoreError> {
        Ok(self.backend.get(key)?.is_some())
    }

    /// Lists degrade to empty when the stored value is unreadable.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.read::<Vec<T>>(key) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring unreadable local list");
                Vec::new()
            }
        }
    }

    /// Replace-or-append into a stored list, matching on `same`.
    fn upsert_into<T, F>(&self, key: &str, item: &T, same: F) -> Result<(), CoreError>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&T) -> bool,
    {
        let mut list: Vec<T> = self.read_list(key);
        match list.iter().position(same) {
            Some(idx) => list[idx] = item.clone(),
            None => list.push(item.clone()),
        }
        self.write(key, &list)
    }

    fn remove_from<T, F>(&self, key: &str, same: F) -> Result<(), CoreError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut list: Vec<T> = self.read_list(key);
        let before = list.len();
        list.retain(|item| !same(item));
        if list.len() != before {
            self.write(key, &list)?;
        }
        Ok(())
    }

    // ── Session ─────────────────────────────────────────────────────

    /// The persisted session, if any. A malformed payload is an error so the
    /// caller can discard it.
    pub fn session(&self) -> Result<Option<UserProfile>, CoreError> {
        self.read(SESSION_KEY)
    }

    pub fn save_session(&self, profile: &UserProfile) -> Result<(), CoreError> {
        self.write(SESSION_KEY, profile)
    }

    pub fn clear_session(&self) -> Result<(), CoreError> {
        self.remove(SESSION_KEY)
    }

    // ── Users ───────────────────────────────────────────────────────

    pub fn users(&self) -> Vec<UserProfile> {
        self.read_list(USERS_KEY)
    }

    /// Users are matched on email, the remote primary key.
    pub fn upsert_user(&self, user: &UserProfile) -> Result<(), CoreError> {
        self.upsert_into(USERS_KEY, user, |u: &UserProfile| u.email == user.email)
    }

    pub fn remove_user(&self, email: &str) -> Result<(), CoreError> {
        self.remove_from(USERS_KEY, |u: &UserProfile| u.email == email)
    }

    pub fn replace_users(&self, users: &[UserProfile]) -> Result<(), CoreError> {
        self.write(USERS_KEY, users)
    }

    // ── Advertisements ──────────────────────────────────────────────

    pub fn ads(&self) -> Vec<Advertisement> {
        self.read_list(ADS_KEY)
    }

    pub fn upsert_ad(&self, ad: &Advertisement) -> Result<(), CoreError> {
        self.upsert_into(ADS_KEY, ad, |a: &Advertisement| a.id == ad.id)
    }

    pub fn replace_ads(&self, ads: &[Advertisement]) -> Result<(), CoreError> {
        self.write(ADS_KEY, ads)
    }

    pub fn remove_ad(&self, id: &str) -> Result<(), CoreError> {
        self.remove_from(ADS_KEY, |a: &Advertisement| a.id == id)
    }

    // ── Transaction mirror ──────────────────────────────────────────

    pub fn mirrored_transactions(&self, user_id: &str) -> Vec<Transaction> {
        self.read_list(&mirror_tx_key(user_id))
    }

    pub fn replace_mirrored_transactions(&self, user_id: &str, txs: &[Transaction]) -> Result<(), CoreError> {
        self.write(&mirror_tx_key(user_id), txs)
    }

    pub fn upsert_mirrored_transaction(&self, user_id: &str, tx: &Transaction) -> Result<(), CoreError> {
        self.upsert_into(&mirror_tx_key(user_id), tx, |t: &Transaction| t.id == tx.id)
    }

    pub fn remove_mirrored_transaction(&self, user_id: &str, id: &str) -> Result<(), CoreError> {
        self.remove_from(&mirror_tx_key(user_id), |t: &Transaction| t.id == id)
    }

    // ── Legacy transactions (migration source) ──────────────────────

    /// Pre-remote transaction list for a user. `Ok(None)` when there is none.
    pub fn legacy_transactions(&self, user_id: &str) -> Result<Option<Vec<Transaction>>, CoreError> {
        self.read(&legacy_tx_key(user_id))
    }

    pub fn set_legacy_transactions(&self, user_id: &str, txs: &[Transaction]) -> Result<(), CoreError> {
        self.write(&legacy_tx_key(user_id), txs)
    }

    pub fn remove_legacy_transactions(&self, user_id: &str) -> Result<(), CoreError> {
        self.remove(&legacy_tx_key(user_id))
    }
}
