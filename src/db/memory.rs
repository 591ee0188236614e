// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory storage backend.
//!
//! Mirrors the Firestore layout: users keyed by subject, email reservations,
//! boards and todos keyed by ID. Cloning shares the underlying maps.

use crate::db::{duplicate_email, UserInsert};
use crate::error::AppError;
use crate::models::{Board, Todo, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    users: DashMap<String, User>,
    user_emails: DashMap<String, String>,
    boards: DashMap<String, Board>,
    todos: DashMap<String, Todo>,
}

/// Process-local database.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user_by_subject(&self, subject: &str) -> Option<User> {
        self.tables.users.get(subject).map(|u| u.clone())
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.clone())
    }

    pub fn insert_user(&self, user: &User) -> Result<UserInsert, AppError> {
        // Holding the vacant entry serializes concurrent inserts for one subject.
        let slot = match self.tables.users.entry(user.external_subject_id.clone()) {
            Entry::Occupied(_) => return Ok(UserInsert::SubjectExists),
            Entry::Vacant(slot) => slot,
        };

        match self.tables.user_emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(duplicate_email()),
            Entry::Vacant(reservation) => {
                reservation.insert(user.id.clone());
            }
        }

        slot.insert(user.clone());
        Ok(UserInsert::Created)
    }

    pub fn update_user(&self, user: &User) {
        self.tables
            .users
            .insert(user.external_subject_id.clone(), user.clone());
    }

    pub fn get_board(&self, board_id: &str) -> Option<Board> {
        self.tables.boards.get(board_id).map(|b| b.clone())
    }

    pub fn list_boards(&self, owner_user_id: &str) -> Vec<Board> {
        self.tables
            .boards
            .iter()
            .filter(|b| b.owner_user_id == owner_user_id)
            .map(|b| b.clone())
            .collect()
    }

    pub fn set_board(&self, board: &Board) {
        self.tables.boards.insert(board.id.clone(), board.clone());
    }

    /// Removes the board before its todos: todos are only reachable through
    /// an owned board, so no reader sees a half-deleted board.
    pub fn delete_board_cascade(&self, board_id: &str) -> usize {
        self.tables.boards.remove(board_id);

        let before = self.tables.todos.len();
        self.tables.todos.retain(|_, todo| todo.board_id != board_id);
        before.saturating_sub(self.tables.todos.len())
    }

    pub fn get_todo(&self, todo_id: &str) -> Option<Todo> {
        self.tables.todos.get(todo_id).map(|t| t.clone())
    }

    pub fn list_todos(&self, board_id: &str) -> Vec<Todo> {
        self.tables
            .todos
            .iter()
            .filter(|t| t.board_id == board_id)
            .map(|t| t.clone())
            .collect()
    }

    pub fn set_todo(&self, todo: &Todo) {
        self.tables.todos.insert(todo.id.clone(), todo.clone());
    }

    pub fn delete_todo(&self, todo_id: &str) {
        self.tables.todos.remove(todo_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_user_enforces_uniqueness() {
        let db = MemoryDb::new();
        let alice = User::new("uid-alice", "alice@example.com", true, None);
        assert_eq!(db.insert_user(&alice).unwrap(), UserInsert::Created);

        // Same subject again
        let again = User::new("uid-alice", "alice@example.com", true, None);
        assert_eq!(db.insert_user(&again).unwrap(), UserInsert::SubjectExists);

        // Different subject, same email
        let clash = User::new("uid-other", "ALICE@example.com", false, None);
        assert!(matches!(
            db.insert_user(&clash),
            Err(AppError::Validation(_))
        ));
        assert!(db.get_user_by_subject("uid-other").is_none());
    }

    #[test]
    fn test_get_user_by_local_id() {
        let db = MemoryDb::new();
        let user = User::new("uid-1", "one@example.com", false, None);
        db.insert_user(&user).unwrap();

        assert_eq!(db.get_user(&user.id), Some(user));
        assert_eq!(db.get_user("missing"), None);
    }
}
