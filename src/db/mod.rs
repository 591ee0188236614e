//! Database layer (Firestore, with an in-memory backend for local runs and tests).

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::{Board, Todo, User};

/// Collection names as constants.
pub mod collections {
    /// Users keyed by identity provider subject
    pub const USERS: &str = "users";
    /// Email reservations keyed by normalized email
    pub const USER_EMAILS: &str = "user_emails";
    pub const BOARDS: &str = "boards";
    pub const TODOS: &str = "todos";
}

/// Outcome of inserting a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    Created,
    /// Another request created a user for the same subject first.
    SubjectExists,
}

pub(crate) fn duplicate_email() -> AppError {
    AppError::invalid_field("email", "Email is already registered")
}

/// Storage handle shared by all services.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    /// Connect to the backend selected in the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.storage_backend {
            StorageBackend::Firestore => Ok(Self::Firestore(
                FirestoreDb::new(&config.gcp_project_id).await?,
            )),
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                Ok(Self::Memory(MemoryDb::new()))
            }
        }
    }

    /// Fresh in-memory database.
    pub fn memory() -> Self {
        Self::Memory(MemoryDb::new())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by identity provider subject.
    pub async fn get_user_by_subject(&self, subject: &str) -> Result<Option<User>, AppError> {
        match self {
            Self::Firestore(db) => db.get_user_by_subject(subject).await,
            Self::Memory(db) => Ok(db.get_user_by_subject(subject)),
        }
    }

    /// Get a user by local ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Self::Firestore(db) => db.get_user(user_id).await,
            Self::Memory(db) => Ok(db.get_user(user_id)),
        }
    }

    /// Insert a new user, enforcing subject and email uniqueness.
    pub async fn insert_user(&self, user: &User) -> Result<UserInsert, AppError> {
        match self {
            Self::Firestore(db) => db.insert_user(user).await,
            Self::Memory(db) => db.insert_user(user),
        }
    }

    /// Overwrite an existing user record.
    pub async fn update_user(&self, user: &User) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.update_user(user).await,
            Self::Memory(db) => {
                db.update_user(user);
                Ok(())
            }
        }
    }

    // ─── Board Operations ────────────────────────────────────────

    /// Get a board if it exists and is owned by `owner_user_id`.
    pub async fn find_board(
        &self,
        board_id: &str,
        owner_user_id: &str,
    ) -> Result<Option<Board>, AppError> {
        let board = match self {
            Self::Firestore(db) => db.get_board(board_id).await?,
            Self::Memory(db) => db.get_board(board_id),
        };
        Ok(board.filter(|b| b.owner_user_id == owner_user_id))
    }

    /// All boards owned by a user (unordered).
    pub async fn list_boards(&self, owner_user_id: &str) -> Result<Vec<Board>, AppError> {
        match self {
            Self::Firestore(db) => db.list_boards(owner_user_id).await,
            Self::Memory(db) => Ok(db.list_boards(owner_user_id)),
        }
    }

    /// Create or overwrite a board.
    pub async fn set_board(&self, board: &Board) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.set_board(board).await,
            Self::Memory(db) => {
                db.set_board(board);
                Ok(())
            }
        }
    }

    /// Delete a board together with all of its todos.
    ///
    /// Returns the number of todos removed.
    pub async fn delete_board_cascade(&self, board_id: &str) -> Result<usize, AppError> {
        match self {
            Self::Firestore(db) => db.delete_board_cascade(board_id).await,
            Self::Memory(db) => Ok(db.delete_board_cascade(board_id)),
        }
    }

    // ─── Todo Operations ─────────────────────────────────────────

    /// Get a todo if it exists and is owned by `owner_user_id`.
    pub async fn find_todo(
        &self,
        todo_id: &str,
        owner_user_id: &str,
    ) -> Result<Option<Todo>, AppError> {
        let todo = match self {
            Self::Firestore(db) => db.get_todo(todo_id).await?,
            Self::Memory(db) => db.get_todo(todo_id),
        };
        Ok(todo.filter(|t| t.owner_user_id == owner_user_id))
    }

    /// All todos on a board (unordered).
    pub async fn list_todos(&self, board_id: &str) -> Result<Vec<Todo>, AppError> {
        match self {
            Self::Firestore(db) => db.list_todos(board_id).await,
            Self::Memory(db) => Ok(db.list_todos(board_id)),
        }
    }

    /// Create or overwrite a todo.
    pub async fn set_todo(&self, todo: &Todo) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.set_todo(todo).await,
            Self::Memory(db) => {
                db.set_todo(todo);
                Ok(())
            }
        }
    }

    pub async fn delete_todo(&self, todo_id: &str) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.delete_todo(todo_id).await,
            Self::Memory(db) => {
                db.delete_todo(todo_id);
                Ok(())
            }
        }
    }
}
