use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::transaction::null_as_default;

/// Avatar assigned to new accounts.
pub const DEFAULT_AVATAR: &str = "👤";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::User => write!(f, "USER"),
        }
    }
}

/// A registered account, as stored in the remote `users` table.
///
/// Passwords are kept in plaintext; this is a single-tenant tracker and
/// the credentials only gate the local view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mobile: String,
    pub pass: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Emoji glyph or a `data:image/...;base64,` URL
    #[serde(default = "default_avatar", deserialize_with = "deserialize_avatar")]
    pub avatar: String,
    /// Never skipped on the wire; a cleared bio is `Some("")`
    #[serde(default)]
    pub bio: Option<String>,
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

fn deserialize_avatar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|a| !a.trim().is_empty()).unwrap_or_else(default_avatar))
}

impl UserProfile {
    /// Identity key: username, falling back to email.
    pub fn user_id(&self) -> &str {
        if self.username.trim().is_empty() {
            &self.email
        } else {
            &self.username
        }
    }

    /// `true` when the login identifier names this account
    /// (by email, mobile number or username).
    pub fn matches_login(&self, login: &str) -> bool {
        !login.is_empty()
            && (self.email == login || self.mobile == login || self.username == login)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// `true` when the avatar holds an embedded image rather than a glyph.
    pub fn has_image_avatar(&self) -> bool {
        self.avatar.starts_with("data:image")
    }

    /// Apply a profile draft. Blank strings in the draft leave the field untouched;
    /// a blank `bio` clears it to `Some("")`.
    pub fn merge(&self, draft: &ProfileDraft) -> UserProfile {
        fn pick(current: &str, new: &Option<String>) -> String {
            match new.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => current.to_string(),
            }
        }

        UserProfile {
            email: pick(&self.email, &draft.email),
            name: pick(&self.name, &draft.name),
            mobile: pick(&self.mobile, &draft.mobile),
            pass: match draft.pass.as_deref() {
                Some(p) if !p.is_empty() => p.to_string(),
                _ => self.pass.clone(),
            },
            role: self.role,
            username: pick(&self.username, &draft.username),
            avatar: pick(&self.avatar, &draft.avatar),
            bio: match &draft.bio {
                Some(b) if b.trim().is_empty() => Some(String::new()),
                Some(b) => Some(b.trim().to_string()),
                None => self.bio.clone(),
            },
        }
    }
}

/// Profile edit form. Only the fields that are `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub username: Option<String>,
    pub pass: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl ProfileDraft {
    pub fn is_empty(&self) -> bool {
        *self == ProfileDraft::default()
    }
}

/// Sign-up form.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpForm {
    pub email: String,
    pub name: String,
    pub mobile: String,
    pub pass: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.email.trim().is_empty() {
            return Err(CoreError::ValidationError("Email is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError("Name is required".into()));
        }
        if self.pass.is_empty() {
            return Err(CoreError::ValidationError("Password is required".into()));
        }
        Ok(())
    }

    /// New accounts use their email as username, role USER and the default avatar.
    pub fn into_profile(self) -> UserProfile {
        let email = self.email.trim().to_string();
        UserProfile {
            username: email.clone(),
            email,
            name: self.name.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            pass: self.pass,
            role: UserRole::User,
            avatar: default_avatar(),
            bio: Some(String::new()),
        }
    }
}
