pub mod errors;
pub mod models;
pub mod remote;
pub mod services;
pub mod storage;

use chrono::Utc;
use models::{
    advertisement::Advertisement,
    filter::TransactionFilter,
    settings::RemoteSettings,
    stats::{DashboardStats, MethodTotals},
    transaction::{PaymentMethod, Transaction, TransactionDraft},
    user::{ProfileDraft, SignUpForm, UserProfile, UserRole},
};
use remote::{memory::MemoryStore, rest::RestStore, traits::RemoteStore};
use services::{
    gateway_service::{MirrorPolicy, PersistenceGateway},
    ledger_service::{Ledger, SyncStatus},
    report_service::ReportService,
    session_service::{Session, SessionManager},
};
use std::sync::Arc;
use storage::cache::LocalCache;

use errors::CoreError;

/// A rendered export, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub filename: String,
    pub content: String,
}

/// Main entry point for the Pocket Ledger core library.
/// Holds the session, the signed-in user's ledger and the persistence gateway.
#[must_use]
pub struct PocketLedger {
    gateway: PersistenceGateway,
    sessions: SessionManager,
    ledger: Option<Ledger>,
    report_service: ReportService,
}

impl std::fmt::Debug for PocketLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketLedger")
            .field("gateway", &self.gateway)
            .field("user", &self.current_user().map(|u| u.user_id().to_string()))
            .field("transactions", &self.ledger.as_ref().map(Ledger::len))
            .finish()
    }
}

impl PocketLedger {
    /// Build on an existing gateway.
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self {
            sessions: SessionManager::new(gateway.clone()),
            gateway,
            ledger: None,
            report_service: ReportService::new(),
        }
    }

    /// Talk to a hosted PostgREST endpoint.
    pub fn connect(
        settings: &RemoteSettings,
        cache: LocalCache,
        policy: MirrorPolicy,
    ) -> Result<Self, CoreError> {
        let remote: Arc<dyn RemoteStore> = Arc::new(RestStore::new(settings)?);
        Ok(Self::new(PersistenceGateway::with_policy(remote, cache, policy)))
    }

    /// Run against an in-process store; nothing leaves the machine except
    /// what the local cache persists.
    pub fn offline(cache: LocalCache) -> Self {
        let remote: Arc<dyn RemoteStore> = Arc::new(MemoryStore::new());
        Self::new(PersistenceGateway::new(remote, cache))
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Startup: pick up a persisted session and load its ledger.
    pub async fn restore(&mut self) -> Option<&UserProfile> {
        let session = self.sessions.restore().cloned();
        match session {
            Some(s) => {
                self.open_ledger(s).await;
                self.current_user()
            }
            None => {
                self.ledger = None;
                None
            }
        }
    }

    pub async fn sign_in(&mut self, login: &str, password: &str) -> Result<&UserProfile, CoreError> {
        let session = self.sessions.sign_in(login, password).await?.clone();
        self.open_ledger(session).await;
        self.current_user().ok_or(CoreError::NotSignedIn)
    }

    pub async fn sign_up(&mut self, form: SignUpForm) -> Result<&UserProfile, CoreError> {
        let session = self.sessions.sign_up(form).await?.clone();
        self.open_ledger(session).await;
        self.current_user().ok_or(CoreError::NotSignedIn)
    }

    pub fn sign_out(&mut self) -> Result<(), CoreError> {
        self.ledger = None;
        self.sessions.sign_out()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.sessions.session().map(Session::profile)
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.sessions.is_signed_in()
    }

    /// Apply a profile edit. If the identity key changed, the ledger is
    /// reopened under the new key.
    pub async fn update_profile(&mut self, draft: &ProfileDraft) -> Result<&UserProfile, CoreError> {
        let session = Session::new(self.sessions.update_profile(draft).await?.clone());
        let same_owner = self
            .ledger
            .as_ref()
            .is_some_and(|l| l.session().user_id() == session.user_id());

        if same_owner {
            if let Some(ledger) = self.ledger.as_mut() {
                ledger.replace_session(session)?;
            }
        } else {
            self.open_ledger(session).await;
        }
        self.current_user().ok_or(CoreError::NotSignedIn)
    }

    // ── Transactions ────────────────────────────────────────────────

    pub fn ledger(&self) -> Result<&Ledger, CoreError> {
        self.ledger.as_ref().ok_or(CoreError::NotSignedIn)
    }

    fn ledger_mut(&mut self) -> Result<&mut Ledger, CoreError> {
        self.ledger.as_mut().ok_or(CoreError::NotSignedIn)
    }

    /// Record a new transaction. Returns its id and whether it reached the remote store.
    pub async fn add_transaction(&mut self, draft: TransactionDraft) -> Result<(String, SyncStatus), CoreError> {
        self.ledger_mut()?.add(draft).await
    }

    pub async fn update_transaction(&mut self, tx: Transaction) -> Result<SyncStatus, CoreError> {
        self.ledger_mut()?.update(tx).await
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<(), CoreError> {
        self.ledger_mut()?.delete(id).await
    }

    pub fn transactions(&self) -> Result<&[Transaction], CoreError> {
        Ok(self.ledger()?.transactions())
    }

    /// Filtered listing, newest first, relative to the current time.
    pub fn filtered_transactions(&self, filter: &TransactionFilter) -> Result<Vec<&Transaction>, CoreError> {
        Ok(self.ledger()?.filtered(filter, Utc::now()))
    }

    pub fn select_method(&mut self, method: PaymentMethod) -> Result<(), CoreError> {
        self.ledger_mut()?.select_method(method);
        Ok(())
    }

    /// Totals for the selected payment method.
    pub fn totals(&self) -> Result<MethodTotals, CoreError> {
        Ok(self.ledger()?.totals())
    }

    pub fn breakdown(&self) -> Result<Vec<MethodTotals>, CoreError> {
        Ok(self.ledger()?.breakdown())
    }

    pub fn dashboard(&self) -> Result<DashboardStats, CoreError> {
        Ok(self.ledger()?.dashboard())
    }

    pub async fn refresh(&mut self) -> Result<(), CoreError> {
        self.ledger_mut()?.refresh().await;
        Ok(())
    }

    // ── Export ──────────────────────────────────────────────────────

    /// Plain-text statement of every transaction, newest first.
    pub fn export_text(&self) -> Result<ExportedReport, CoreError> {
        let ledger = self.ledger()?;
        let profile = ledger.session().profile();
        Ok(ExportedReport {
            filename: self.report_service.filename(profile, "txt"),
            content: self.report_service.render_text(
                profile,
                ledger.transactions(),
                Utc::now().date_naive(),
            ),
        })
    }

    pub fn export_csv(&self) -> Result<ExportedReport, CoreError> {
        let ledger = self.ledger()?;
        let profile = ledger.session().profile();
        Ok(ExportedReport {
            filename: self.report_service.filename(profile, "csv"),
            content: self.report_service.render_csv(ledger.transactions())?,
        })
    }

    // ── Advertisements ──────────────────────────────────────────────

    /// Active ads, newest first.
    pub async fn active_ads(&self) -> Vec<Advertisement> {
        self.gateway
            .fetch_ads()
            .await
            .into_iter()
            .filter(|a| a.active)
            .collect()
    }

    /// Every ad, including inactive ones. Admin only.
    pub async fn all_ads(&self) -> Result<Vec<Advertisement>, CoreError> {
        self.require_admin()?;
        Ok(self.gateway.fetch_ads().await)
    }

    pub async fn save_ad(&self, ad: &Advertisement) -> Result<(), CoreError> {
        self.require_admin()?;
        ad.validate()?;
        self.gateway.save_ad(ad).await
    }

    pub async fn delete_ad(&self, id: &str) -> Result<(), CoreError> {
        self.require_admin()?;
        self.gateway.delete_ad(id).await
    }

    // ── Internal ────────────────────────────────────────────────────

    fn require_admin(&self) -> Result<(), CoreError> {
        match self.current_user() {
            None => Err(CoreError::NotSignedIn),
            Some(u) if u.is_admin() => Ok(()),
            Some(_) => Err(CoreError::Forbidden(UserRole::Admin.to_string())),
        }
    }

    async fn open_ledger(&mut self, session: Session) {
        self.ledger = Some(Ledger::open(self.gateway.clone(), session).await);
    }
}
