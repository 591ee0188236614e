// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (keyed by identity provider subject)
//! - Email reservations (uniqueness of user emails)
//! - Boards
//! - Todos

use crate::db::{collections, duplicate_email, UserInsert};
use crate::error::AppError;
use crate::models::{Board, Todo, User};
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Email reservation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailReservation {
    user_id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by identity provider subject (the document ID).
    pub async fn get_user_by_subject(&self, subject: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(subject)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by local ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("id").eq(user_id)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Insert a new user.
    ///
    /// The user document is created first (its ID is the subject, so a
    /// concurrent first sign-in loses here), then the email reservation.
    /// A taken email rolls back the user document.
    pub async fn insert_user(&self, user: &User) -> Result<UserInsert, AppError> {
        let inserted: Result<User, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.external_subject_id)
            .object(user)
            .execute()
            .await;

        match inserted {
            Ok(_) => {}
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(
                    subject = %user.external_subject_id,
                    "User already created by a concurrent request"
                );
                return Ok(UserInsert::SubjectExists);
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        let reservation = EmailReservation {
            user_id: user.id.clone(),
        };
        let reserved: Result<EmailReservation, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(&user.email)
            .object(&reservation)
            .execute()
            .await;

        match reserved {
            Ok(_) => Ok(UserInsert::Created),
            Err(err) => {
                // Compensate: the user document must not outlive a failed reservation.
                if let Err(e) = self
                    .client
                    .fluent()
                    .delete()
                    .from(collections::USERS)
                    .document_id(&user.external_subject_id)
                    .execute()
                    .await
                {
                    tracing::error!(
                        error = %e,
                        subject = %user.external_subject_id,
                        "Failed to roll back user after email reservation failure"
                    );
                }

                match err {
                    FirestoreError::DataConflictError(_) => Err(duplicate_email()),
                    other => Err(AppError::Database(other.to_string())),
                }
            }
        }
    }

    /// Overwrite an existing user.
    pub async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.external_subject_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Board Operations ────────────────────────────────────────

    /// Get a board by ID.
    pub async fn get_board(&self, board_id: &str) -> Result<Option<Board>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::BOARDS)
            .obj()
            .one(board_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all boards owned by a user.
    pub async fn list_boards(&self, owner_user_id: &str) -> Result<Vec<Board>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::BOARDS)
            .filter(|q| q.for_all([q.field("ownerUserId").eq(owner_user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a board.
    pub async fn set_board(&self, board: &Board) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::BOARDS)
            .document_id(&board.id)
            .object(board)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a board and its todos.
    ///
    /// Boards with up to `BATCH_SIZE` todos go in a single transaction.
    /// Larger ones delete todos in batches and the board in the last batch,
    /// so an interrupted delete leaves the board in place and can simply be
    /// retried.
    pub async fn delete_board_cascade(&self, board_id: &str) -> Result<usize, AppError> {
        let todo_ids: Vec<String> = self
            .list_todos(board_id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        let chunks = deletion_batches(&todo_ids);
        let last = chunks.len() - 1;

        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for todo_id in chunk {
                self.client
                    .fluent()
                    .delete()
                    .from(collections::TODOS)
                    .document_id(todo_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add todo deletion to transaction: {}",
                            e
                        ))
                    })?;
            }

            if index == last {
                self.client
                    .fluent()
                    .delete()
                    .from(collections::BOARDS)
                    .document_id(board_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add board deletion to transaction: {}",
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit board deletion: {}", e))
            })?;
        }

        tracing::debug!(board_id, todos = todo_ids.len(), "Board deleted with todos");
        Ok(todo_ids.len())
    }

    // ─── Todo Operations ─────────────────────────────────────────

    /// Get a todo by ID.
    pub async fn get_todo(&self, todo_id: &str) -> Result<Option<Todo>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::TODOS)
            .obj()
            .one(todo_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all todos on a board.
    pub async fn list_todos(&self, board_id: &str) -> Result<Vec<Todo>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(|q| q.for_all([q.field("boardId").eq(board_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a todo.
    pub async fn set_todo(&self, todo: &Todo) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::TODOS)
            .document_id(&todo.id)
            .object(todo)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_todo(&self, todo_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::TODOS)
            .document_id(todo_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Split todo IDs into transaction batches. Always yields at least one batch,
/// so the board deletion has somewhere to go.
fn deletion_batches(todo_ids: &[String]) -> Vec<&[String]> {
    let mut batches: Vec<&[String]> = todo_ids.chunks(BATCH_SIZE).collect();
    if batches.is_empty() {
        batches.push(&[]);
    }
    batches
}
