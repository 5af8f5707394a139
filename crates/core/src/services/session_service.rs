use base64::Engine as _;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use crate::errors::CoreError;
use crate::models::user::{ProfileDraft, SignUpForm, UserProfile};
use crate::services::gateway_service::PersistenceGateway;

/// An authenticated user. Handed explicitly to whatever needs the identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    profile: UserProfile,
}

impl Session {
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Owner key for this user's transactions.
    pub fn user_id(&self) -> &str {
        self.profile.user_id()
    }
}

/// Lifecycle: `SignedOut → SigningIn → SignedIn → SignedOut`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    SignedOut,
    SigningIn,
    SignedIn(Session),
}

/// Owns the signed-in identity and its persisted copy under `W_SESSION`.
///
/// Credentials are checked by a linear scan of the user list with exact
/// plaintext password comparison. The persisted session has no expiry.
#[derive(Debug)]
pub struct SessionManager {
    gateway: PersistenceGateway,
    state: SessionState,
}

impl SessionManager {
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self {
            gateway,
            state: SessionState::SignedOut,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::SignedIn(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }

    /// Pick up a persisted session at startup. A malformed payload is
    /// discarded and the manager stays signed out.
    pub fn restore(&mut self) -> Option<&Session> {
        let cache = self.gateway.cache();
        match cache.session() {
            Ok(Some(profile)) => {
                tracing::info!(user_id = profile.user_id(), "restored persisted session");
                self.state = SessionState::SignedIn(Session::new(profile));
            }
            Ok(None) => self.state = SessionState::SignedOut,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed persisted session");
                if let Err(e) = cache.clear_session() {
                    tracing::warn!(error = %e, "failed to remove malformed session");
                }
                self.state = SessionState::SignedOut;
            }
        }
        self.session()
    }

    /// Authenticate by email, mobile number or username plus password.
    ///
    /// Unknown identifiers and wrong passwords produce the same error.
    pub async fn sign_in(&mut self, login: &str, password: &str) -> Result<&Session, CoreError> {
        self.state = SessionState::SigningIn;
        let login = login.trim();

        let users = self.gateway.fetch_users().await;
        let found = users
            .into_iter()
            .find(|u| u.matches_login(login) && u.pass == password);

        match found {
            Some(profile) => self.establish(profile),
            None => {
                self.state = SessionState::SignedOut;
                tracing::info!("sign-in rejected");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    /// Register a new account and sign it in.
    ///
    /// The remote write must succeed; otherwise no session is created.
    pub async fn sign_up(&mut self, form: SignUpForm) -> Result<&Session, CoreError> {
        form.validate()?;
        self.state = SessionState::SigningIn;

        let profile = form.into_profile();
        if let Err(e) = self.gateway.save_user(&profile).await {
            self.state = SessionState::SignedOut;
            return Err(e);
        }
        self.establish(profile)
    }

    /// Forget the identity and its persisted copy.
    pub fn sign_out(&mut self) -> Result<(), CoreError> {
        if let Some(s) = self.session() {
            tracing::info!(user_id = s.user_id(), "signed out");
        }
        self.state = SessionState::SignedOut;
        self.gateway.cache().clear_session()
    }

    /// Merge a draft into the current profile, save it remotely, then
    /// refresh the persisted session. A remote failure leaves the session as it was.
    pub async fn update_profile(&mut self, draft: &ProfileDraft) -> Result<&UserProfile, CoreError> {
        let current = self.session().ok_or(CoreError::NotSignedIn)?;
        let updated = current.profile().merge(draft);

        if updated.email.trim().is_empty() || updated.name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Email and name must not be empty".into(),
            ));
        }

        self.gateway.save_user(&updated).await?;
        self.gateway.cache().save_session(&updated)?;
        self.state = SessionState::SignedIn(Session::new(updated));

        match &self.state {
            SessionState::SignedIn(s) => Ok(s.profile()),
            _ => Err(CoreError::NotSignedIn),
        }
    }

    fn establish(&mut self, profile: UserProfile) -> Result<&Session, CoreError> {
        if let Err(e) = self.gateway.cache().save_session(&profile) {
            self.state = SessionState::SignedOut;
            return Err(e);
        }
        tracing::info!(user_id = profile.user_id(), "signed in");
        self.state = SessionState::SignedIn(Session::new(profile));
        self.session().ok_or(CoreError::NotSignedIn)
    }
}

// ── Avatars ─────────────────────────────────────────────────────────

/// Guess an image MIME type from a file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as a `data:` URL suitable for the profile avatar field.
pub fn avatar_data_url(bytes: &[u8], mime: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Read an image file into a `data:` URL. No size limit, no format check.
#[cfg(not(target_arch = "wasm32"))]
pub fn avatar_from_file(path: impl AsRef<Path>) -> Result<String, CoreError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let mime = path
        .extension()
        .and_then(|e| e.to_str())
        .map(mime_for_extension)
        .unwrap_or("application/octet-stream");
    Ok(avatar_data_url(&bytes, mime))
}
