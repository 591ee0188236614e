// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: maps identity provider subjects to local users.

use crate::db::{Database, UserInsert};
use crate::error::AppError;
use crate::models::User;
use crate::services::identity::IdentityClaims;
use chrono::Utc;

/// Which provider-reported fields are reconciled onto an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimSync {
    /// Email verification status only (per-request authentication).
    EmailVerified,
    /// Email verification status and display name (register/login).
    Profile,
}

/// Find-or-create of local users.
#[derive(Clone)]
pub struct UserDirectory {
    db: Database,
}

impl UserDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolve the local user for verified claims, creating it on first sight
    /// and persisting claim drift selected by `sync`.
    ///
    /// Performs at most one write.
    pub async fn resolve(&self, claims: &IdentityClaims, sync: ClaimSync) -> Result<User, AppError> {
        if let Some(user) = self.db.get_user_by_subject(&claims.subject).await? {
            return self.reconcile(user, claims, sync).await;
        }

        let user = User::new(
            &claims.subject,
            &claims.email,
            claims.email_verified,
            claims.display_name.clone(),
        );

        match self.db.insert_user(&user).await? {
            UserInsert::Created => {
                tracing::info!(
                    user_id = %user.id,
                    subject = %user.external_subject_id,
                    "Created user on first sign-in"
                );
                Ok(user)
            }
            UserInsert::SubjectExists => {
                // Lost a first-sign-in race; use the winner's record as-is.
                self.db
                    .get_user_by_subject(&claims.subject)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "user {} vanished after insert conflict",
                            claims.subject
                        ))
                    })
            }
        }
    }

    /// Get a user by local ID.
    pub async fn get(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.db.get_user(user_id).await
    }

    async fn reconcile(
        &self,
        mut user: User,
        claims: &IdentityClaims,
        sync: ClaimSync,
    ) -> Result<User, AppError> {
        let mut changed = false;

        if user.email_verified != claims.email_verified {
            user.email_verified = claims.email_verified;
            changed = true;
        }

        if sync == ClaimSync::Profile {
            if let Some(name) = &claims.display_name {
                if user.display_name.as_ref() != Some(name) {
                    user.display_name = Some(name.clone());
                    changed = true;
                }
            }
        }

        if changed {
            user.updated_at = Utc::now();
            self.db.update_user(&user).await?;
            tracing::debug!(user_id = %user.id, ?sync, "Updated user from provider claims");
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(subject: &str, verified: bool, name: Option<&str>) -> IdentityClaims {
        IdentityClaims {
            subject: subject.to_string(),
            email: format!("{subject}@example.com"),
            email_verified: verified,
            display_name: name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_resolve_creates_once() {
        let directory = UserDirectory::new(Database::memory());
        let c = claims("uid-1", false, None);

        let first = directory.resolve(&c, ClaimSync::EmailVerified).await.unwrap();
        let second = directory.resolve(&c, ClaimSync::EmailVerified).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_email_verified_drift_is_persisted() {
        let db = Database::memory();
        let directory = UserDirectory::new(db.clone());

        let created = directory
            .resolve(&claims("uid-1", false, None), ClaimSync::EmailVerified)
            .await
            .unwrap();
        let updated = directory
            .resolve(&claims("uid-1", true, None), ClaimSync::EmailVerified)
            .await
            .unwrap();

        assert!(updated.email_verified);
        assert!(updated.updated_at >= created.updated_at);
        let stored = db.get_user(&created.id).await.unwrap().unwrap();
        assert!(stored.email_verified);
    }

    #[tokio::test]
    async fn test_display_name_only_synced_for_profile() {
        let directory = UserDirectory::new(Database::memory());
        directory
            .resolve(&claims("uid-1", true, Some("Old")), ClaimSync::EmailVerified)
            .await
            .unwrap();

        let gate = directory
            .resolve(&claims("uid-1", true, Some("New")), ClaimSync::EmailVerified)
            .await
            .unwrap();
        assert_eq!(gate.display_name.as_deref(), Some("Old"));

        let login = directory
            .resolve(&claims("uid-1", true, Some("New")), ClaimSync::Profile)
            .await
            .unwrap();
        assert_eq!(login.display_name.as_deref(), Some("New"));
    }
}
