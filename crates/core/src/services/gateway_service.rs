use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::advertisement::Advertisement;
use crate::models::transaction::Transaction;
use crate::models::user::UserProfile;
use crate::remote::traits::{Collection, Direction, Query, RemoteStore};
use crate::storage::cache::LocalCache;

/// What happens to the local mirror when a record is written.
///
/// The remote store is always tried first and its failure is always
/// reported to the caller; the policy only decides the mirror's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorPolicy {
    /// Mirror every write, whether or not the remote accepted it.
    #[default]
    WriteThrough,
    /// Mirror only writes the remote accepted; drop the record from the
    /// mirror when the remote write fails.
    Invalidate,
}

/// Single entry point for all persistence: remote store first, local
/// mirror second.
///
/// - Reads never fail: a remote error is logged and the mirror is returned.
///   A successful read refreshes the mirror.
/// - Writes and deletes always report a remote error to the caller after
///   applying the [`MirrorPolicy`].
#[derive(Clone)]
pub struct PersistenceGateway {
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    policy: MirrorPolicy,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("remote", &self.remote.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl PersistenceGateway {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache) -> Self {
        Self::with_policy(remote, cache, MirrorPolicy::default())
    }

    pub fn with_policy(remote: Arc<dyn RemoteStore>, cache: LocalCache, policy: MirrorPolicy) -> Self {
        Self {
            remote,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn policy(&self) -> MirrorPolicy {
        self.policy
    }

    // ── Users ───────────────────────────────────────────────────────

    /// All registered users; falls back to the local user list.
    pub async fn fetch_users(&self) -> Vec<UserProfile> {
        match self.remote.fetch_all(Collection::Users, &Query::all()).await {
            Ok(rows) => {
                let users: Vec<UserProfile> = decode_rows(Collection::Users, rows);
                if let Err(e) = self.cache.replace_users(&users) {
                    tracing::warn!(error = %e, "failed to refresh local user list");
                }
                users
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetching users failed; using local copy");
                self.cache.users()
            }
        }
    }

    pub async fn save_user(&self, user: &UserProfile) -> Result<(), CoreError> {
        let result = self.remote.upsert(Collection::Users, vec![encode(user)?]).await;
        self.apply_mirror(Collection::Users, &result, || self.cache.upsert_user(user), || {
            self.cache.remove_user(&user.email)
        });
        result
    }

    // ── Transactions ────────────────────────────────────────────────

    /// A user's transactions, newest first; falls back to the local mirror.
    pub async fn fetch_transactions(&self, user_id: &str) -> Vec<Transaction> {
        let query = Query::all()
            .eq("user_id", user_id)
            .order_by("date", Direction::Descending);
        match self.remote.fetch_all(Collection::Transactions, &query).await {
            Ok(rows) => {
                let mut txs: Vec<Transaction> = decode_rows(Collection::Transactions, rows);
                txs.sort_by(|a, b| b.date.cmp(&a.date));
                if let Err(e) = self.cache.replace_mirrored_transactions(user_id, &txs) {
                    tracing::warn!(user_id, error = %e, "failed to refresh local transaction mirror");
                }
                txs
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "fetching transactions failed; using local mirror");
                let mut txs = self.cache.mirrored_transactions(user_id);
                txs.sort_by(|a, b| b.date.cmp(&a.date));
                txs
            }
        }
    }

    /// Upsert a single transaction.
    pub async fn save_transaction(&self, tx: &Transaction) -> Result<(), CoreError> {
        let result = self
            .remote
            .upsert(Collection::Transactions, vec![encode(tx)?])
            .await;
        self.apply_mirror(
            Collection::Transactions,
            &result,
            || self.cache.upsert_mirrored_transaction(&tx.user_id, tx),
            || self.cache.remove_mirrored_transaction(&tx.user_id, &tx.id),
        );
        result
    }

    /// Batch-upsert a user's whole list in one call. Every record's owner is
    /// forced to `user_id`. Not atomic: a failure may leave a subset written.
    pub async fn sync_transactions(&self, user_id: &str, txs: &[Transaction]) -> Result<(), CoreError> {
        let owned: Vec<Transaction> = txs
            .iter()
            .map(|t| Transaction {
                user_id: user_id.to_string(),
                ..t.clone()
            })
            .collect();
        let records = owned.iter().map(encode).collect::<Result<Vec<_>, _>>()?;

        let result = self.remote.upsert(Collection::Transactions, records).await;
        self.apply_mirror(
            Collection::Transactions,
            &result,
            || {
                owned
                    .iter()
                    .try_for_each(|t| self.cache.upsert_mirrored_transaction(user_id, t))
            },
            || {
                owned
                    .iter()
                    .try_for_each(|t| self.cache.remove_mirrored_transaction(user_id, &t.id))
            },
        );
        result
    }

    /// Delete a transaction. The mirror entry goes away either way.
    pub async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<(), CoreError> {
        let result = self.remote.delete(Collection::Transactions, id).await;
        if let Err(e) = self.cache.remove_mirrored_transaction(user_id, id) {
            tracing::warn!(id, error = %e, "failed to drop transaction from local mirror");
        }
        if let Err(e) = &result {
            tracing::warn!(id, error = %e, "remote transaction delete failed");
        }
        result
    }

    // ── Advertisements ──────────────────────────────────────────────

    /// All ads, newest first; falls back to the local ad list.
    pub async fn fetch_ads(&self) -> Vec<Advertisement> {
        let query = Query::all().order_by("createdAt", Direction::Descending);
        let mut ads: Vec<Advertisement> = match self.remote.fetch_all(Collection::Advertisements, &query).await {
            Ok(rows) => {
                let ads: Vec<Advertisement> = decode_rows(Collection::Advertisements, rows);
                if let Err(e) = self.cache.replace_ads(&ads) {
                    tracing::warn!(error = %e, "failed to refresh local ad list");
                }
                ads
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetching ads failed; using local copy");
                self.cache.ads()
            }
        };
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ads
    }

    pub async fn save_ad(&self, ad: &Advertisement) -> Result<(), CoreError> {
        let result = self
            .remote
            .upsert(Collection::Advertisements, vec![encode(ad)?])
            .await;
        self.apply_mirror(Collection::Advertisements, &result, || self.cache.upsert_ad(ad), || {
            self.cache.remove_ad(&ad.id)
        });
        result
    }

    /// Delete an ad. Same reporting policy as transaction deletes.
    pub async fn delete_ad(&self, id: &str) -> Result<(), CoreError> {
        let result = self.remote.delete(Collection::Advertisements, id).await;
        if let Err(e) = self.cache.remove_ad(id) {
            tracing::warn!(id, error = %e, "failed to drop ad from local copy");
        }
        if let Err(e) = &result {
            tracing::warn!(id, error = %e, "remote ad delete failed");
        }
        result
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Update the mirror after a remote write according to the policy.
    /// Mirror failures are logged, never surfaced: the mirror is best-effort.
    fn apply_mirror<W, R>(&self, collection: Collection, remote: &Result<(), CoreError>, write: W, drop: R)
    where
        W: FnOnce() -> Result<(), CoreError>,
        R: FnOnce() -> Result<(), CoreError>,
    {
        if let Err(e) = remote {
            tracing::warn!(%collection, error = %e, policy = ?self.policy, "remote write failed");
        }
        let mirrored = match (self.policy, remote.is_ok()) {
            (MirrorPolicy::WriteThrough, _) | (MirrorPolicy::Invalidate, true) => write(),
            (MirrorPolicy::Invalidate, false) => drop(),
        };
        if let Err(e) = mirrored {
            tracing::warn!(%collection, error = %e, "local mirror update failed");
        }
    }
}

fn encode<T: Serialize>(record: &T) -> Result<Value, CoreError> {
    serde_json::to_value(record).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Decode remote rows, skipping (and logging) any that don't fit the model.
fn decode_rows<T: DeserializeOwned>(collection: Collection, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(%collection, error = %e, "skipping malformed remote record");
                None
            }
        })
        .collect()
}
