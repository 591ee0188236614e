//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local user record, linked to an identity provider subject.
///
/// Stored in Firestore keyed by `external_subject_id`, which keeps subjects
/// unique without a secondary index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Local user ID (UUID)
    pub id: String,
    /// Identity provider subject (Firebase UID)
    pub external_subject_id: String,
    /// Email address, trimmed and lowercased
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user record from provider-reported identity.
    pub fn new(
        external_subject_id: &str,
        email: &str,
        email_verified: bool,
        display_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            external_subject_id: external_subject_id.to_string(),
            email: normalize_email(email),
            email_verified,
            display_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emails are unique case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
