use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::filter::TransactionFilter;
use crate::models::stats::{DashboardStats, MethodTotals};
use crate::models::transaction::{self, PaymentMethod, Transaction, TransactionDraft};
use crate::services::aggregation_service::AggregationService;
use crate::services::gateway_service::PersistenceGateway;
use crate::services::migration_service::{MigrationReport, MigrationService};
use crate::services::session_service::Session;

/// Whether a local change reached the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    /// Kept in memory (and in the mirror, per policy) but not stored remotely
    LocalOnly,
}

/// In-memory transaction state for one signed-in user.
///
/// Mutations update memory first, then push to the remote store. Derived
/// totals for the selected payment method are recomputed after every change.
#[derive(Debug)]
pub struct Ledger {
    gateway: PersistenceGateway,
    session: Session,
    /// Newest first
    transactions: Vec<Transaction>,
    selected_method: PaymentMethod,
    totals: MethodTotals,
    aggregation: AggregationService,
    last_migration: Option<MigrationReport>,
}

impl Ledger {
    /// Migrate any legacy local list for this user, then load from the
    /// remote store (or the mirror when the remote is unreachable).
    pub async fn open(gateway: PersistenceGateway, session: Session) -> Self {
        let user_id = session.user_id().to_string();

        let last_migration = match MigrationService::new().migrate(&gateway, &user_id).await {
            Ok(report) => Some(report),
            Err(CoreError::MigrationIncomplete {
                migrated, remaining, ..
            }) => Some(MigrationReport {
                migrated,
                remaining,
            }),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "legacy migration did not finish");
                None
            }
        };

        let transactions = gateway.fetch_transactions(&user_id).await;
        tracing::info!(user_id = %user_id, count = transactions.len(), "ledger opened");

        let mut ledger = Self {
            gateway,
            session,
            transactions,
            selected_method: PaymentMethod::default(),
            totals: MethodTotals {
                method: PaymentMethod::default(),
                income: 0.0,
                expense: 0.0,
                balance: 0.0,
            },
            aggregation: AggregationService::new(),
            last_migration,
        };
        ledger.recompute();
        ledger
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Swap in a refreshed session for the same user (e.g. after a profile edit).
    pub fn replace_session(&mut self, session: Session) -> Result<(), CoreError> {
        if session.user_id() != self.session.user_id() {
            return Err(CoreError::ValidationError(format!(
                "Ledger belongs to '{}', not '{}'",
                self.session.user_id(),
                session.user_id()
            )));
        }
        self.session = session;
        Ok(())
    }

    /// Outcome of the migration run at open. A run that stopped part way
    /// reports what is left; `None` if the legacy list could not be read.
    pub fn last_migration(&self) -> Option<MigrationReport> {
        self.last_migration
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// All transactions, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn filtered(&self, filter: &TransactionFilter, now: DateTime<Utc>) -> Vec<&Transaction> {
        self.aggregation.filter(&self.transactions, filter, now)
    }

    // ── Derived totals ──────────────────────────────────────────────

    pub fn selected_method(&self) -> PaymentMethod {
        self.selected_method
    }

    pub fn select_method(&mut self, method: PaymentMethod) {
        self.selected_method = method;
        self.recompute();
    }

    /// Totals for the selected payment method.
    pub fn totals(&self) -> MethodTotals {
        self.totals
    }

    pub fn breakdown(&self) -> Vec<MethodTotals> {
        self.aggregation.breakdown(&self.transactions)
    }

    pub fn dashboard(&self) -> DashboardStats {
        self.aggregation.dashboard(&self.transactions)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Record a new transaction and push the whole list.
    pub async fn add(&mut self, draft: TransactionDraft) -> Result<(String, SyncStatus), CoreError> {
        draft.validate()?;
        let now = Utc::now();
        let mut id = transaction::generate_id(now);
        // Two submissions within the same millisecond would collide locally
        while self.get(&id).is_some() {
            id = (id.parse::<i64>().unwrap_or(0) + 1).to_string();
        }
        let tx = draft.into_transaction(id.clone(), self.session.user_id(), now);

        self.transactions.insert(0, tx);
        self.recompute();
        Ok((id, self.push_all().await))
    }

    /// Replace a transaction by id and push the whole list.
    pub async fn update(&mut self, updated: Transaction) -> Result<SyncStatus, CoreError> {
        transaction::validate_amount(updated.amount)?;
        if updated.description.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Description must not be empty".into(),
            ));
        }
        let slot = self
            .transactions
            .iter_mut()
            .find(|t| t.id == updated.id)
            .ok_or_else(|| CoreError::TransactionNotFound(updated.id.clone()))?;
        *slot = Transaction {
            user_id: self.session.user_id().to_string(),
            ..updated
        };
        self.transactions.sort_by(|a, b| b.date.cmp(&a.date));
        self.recompute();
        Ok(self.push_all().await)
    }

    /// Remove a transaction locally, then remotely.
    ///
    /// The remote delete is always sent, so deleting an id again (or one
    /// already gone locally) is a no-op rather than an error.
    pub async fn delete(&mut self, id: &str) -> Result<(), CoreError> {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        if self.transactions.len() != before {
            self.recompute();
        }
        self.gateway.delete_transaction(self.session.user_id(), id).await
    }

    /// Re-read the list from the remote store (or mirror).
    pub async fn refresh(&mut self) {
        self.transactions = self.gateway.fetch_transactions(self.session.user_id()).await;
        self.recompute();
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn push_all(&self) -> SyncStatus {
        match self
            .gateway
            .sync_transactions(self.session.user_id(), &self.transactions)
            .await
        {
            Ok(()) => SyncStatus::Synced,
            Err(e) => {
                tracing::warn!(user_id = self.session.user_id(), error = %e, "transaction sync failed; keeping local state");
                SyncStatus::LocalOnly
            }
        }
    }

    fn recompute(&mut self) {
        self.totals = self
            .aggregation
            .method_totals(&self.transactions, self.selected_method);
    }
}
