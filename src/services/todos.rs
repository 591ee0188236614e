// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Todo CRUD scoped to the owning user and parent board.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::todo::{CreateTodo, UpdateTodo};
use crate::models::{Board, Todo};

#[derive(Clone)]
pub struct TodoService {
    db: Database,
}

impl TodoService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Todos on an owned board, newest first.
    pub async fn list(&self, owner_user_id: &str, board_id: &str) -> Result<Vec<Todo>> {
        let board = self.owned_board(owner_user_id, board_id).await?;

        let mut todos = self.db.list_todos(&board.id).await?;
        todos.retain(|t| t.owner_user_id == owner_user_id);
        todos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(todos)
    }

    pub async fn get(&self, owner_user_id: &str, todo_id: &str) -> Result<Todo> {
        self.owned_todo(owner_user_id, todo_id).await
    }

    /// Create a todo on a board; the board must belong to the caller.
    pub async fn create(
        &self,
        owner_user_id: &str,
        board_id: &str,
        input: CreateTodo,
    ) -> Result<Todo> {
        let input = input.normalized();
        let due_date = input.check()?;

        let board = self.owned_board(owner_user_id, board_id).await?;

        let todo = Todo::new(input, due_date, &board.id, owner_user_id);
        self.db.set_todo(&todo).await?;

        tracing::info!(todo_id = %todo.id, board_id, "Todo created");
        Ok(todo)
    }

    /// Partial update; only supplied fields are overwritten.
    pub async fn update(
        &self,
        owner_user_id: &str,
        todo_id: &str,
        update: UpdateTodo,
    ) -> Result<Todo> {
        let update = update.normalized();
        let due_date = update.check()?;

        let mut todo = self.owned_todo(owner_user_id, todo_id).await?;
        if todo.apply(update, due_date) {
            self.db.set_todo(&todo).await?;
            tracing::debug!(todo_id, completed = todo.completed, "Todo updated");
        }
        Ok(todo)
    }

    pub async fn delete(&self, owner_user_id: &str, todo_id: &str) -> Result<()> {
        let todo = self.owned_todo(owner_user_id, todo_id).await?;
        self.db.delete_todo(&todo.id).await?;

        tracing::info!(todo_id, "Todo deleted");
        Ok(())
    }

    async fn owned_board(&self, owner_user_id: &str, board_id: &str) -> Result<Board> {
        self.db
            .find_board(board_id, owner_user_id)
            .await?
            .ok_or_else(AppError::board_not_found)
    }

    /// The todo and its parent board must both belong to the caller.
    async fn owned_todo(&self, owner_user_id: &str, todo_id: &str) -> Result<Todo> {
        let todo = self
            .db
            .find_todo(todo_id, owner_user_id)
            .await?
            .ok_or_else(AppError::todo_not_found)?;

        if self
            .db
            .find_board(&todo.board_id, owner_user_id)
            .await?
            .is_none()
        {
            tracing::warn!(
                todo_id,
                board_id = %todo.board_id,
                "Todo parent board missing or not owned"
            );
            return Err(AppError::todo_not_found());
        }

        Ok(todo)
    }
}
