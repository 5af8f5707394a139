use crate::errors::CoreError;
use crate::models::transaction::Transaction;
use crate::services::gateway_service::PersistenceGateway;

/// Outcome of a migration attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records upserted to the remote store in this run
    pub migrated: usize,
    /// Records still waiting under the legacy key
    pub remaining: usize,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// Moves pre-remote, local-only transaction lists into the remote store.
///
/// Records are upserted one at a time. If an upsert fails the run stops
/// and the legacy key is rewritten with the records not yet migrated, so
/// the next sign-in resumes from there. Upserts are keyed by id, so a
/// record sent twice is harmless.
pub struct MigrationService;

impl MigrationService {
    pub fn new() -> Self {
        Self
    }

    /// Migrate `GLOBAL_TX_<user_id>` if present.
    ///
    /// Missing payment methods have already been folded into CASH when the
    /// legacy list was decoded; ownership is forced to `user_id`.
    pub async fn migrate(
        &self,
        gateway: &PersistenceGateway,
        user_id: &str,
    ) -> Result<MigrationReport, CoreError> {
        let cache = gateway.cache();
        let legacy = match cache.legacy_transactions(user_id)? {
            Some(txs) => txs,
            None => return Ok(MigrationReport::default()),
        };

        if legacy.is_empty() {
            cache.remove_legacy_transactions(user_id)?;
            return Ok(MigrationReport::default());
        }

        tracing::info!(user_id, count = legacy.len(), "migrating local-only transactions");

        let total = legacy.len();
        for (done, tx) in legacy.iter().enumerate() {
            let owned = Transaction {
                user_id: user_id.to_string(),
                ..tx.clone()
            };
            if let Err(e) = gateway.save_transaction(&owned).await {
                let rest = &legacy[done..];
                cache.set_legacy_transactions(user_id, rest)?;
                tracing::warn!(
                    user_id,
                    migrated = done,
                    remaining = rest.len(),
                    error = %e,
                    "migration stopped; unmigrated records kept for next sign-in"
                );
                return Err(CoreError::MigrationIncomplete {
                    migrated: done,
                    remaining: rest.len(),
                    message: e.to_string(),
                });
            }
        }

        cache.remove_legacy_transactions(user_id)?;
        tracing::info!(user_id, migrated = total, "migration complete");
        Ok(MigrationReport {
            migrated: total,
            remaining: 0,
        })
    }
}

impl Default for MigrationService {
    fn default() -> Self {
        Self::new()
    }
}
