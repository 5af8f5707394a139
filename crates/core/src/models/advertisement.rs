use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::transaction::deserialize_timestamp;

/// Admin-curated banner shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "createdAt", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Advertisement {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            link: link.into(),
            image_url: image_url.into(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::ValidationError("Ad title must not be empty".into()));
        }
        if !(self.link.starts_with("http://") || self.link.starts_with("https://")) {
            return Err(CoreError::ValidationError(format!(
                "Ad link must be an http(s) URL, got '{}'",
                self.link
            )));
        }
        Ok(())
    }
}
