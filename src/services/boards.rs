// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Board CRUD scoped to the owning user.
//!
//! A board owned by someone else is reported exactly like a missing one.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::board::{CreateBoard, UpdateBoard};
use crate::models::Board;
use validator::Validate;

#[derive(Clone)]
pub struct BoardService {
    db: Database,
}

impl BoardService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Boards owned by the user, newest first.
    pub async fn list(&self, owner_user_id: &str) -> Result<Vec<Board>> {
        let mut boards = self.db.list_boards(owner_user_id).await?;
        boards.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(boards)
    }

    pub async fn get(&self, owner_user_id: &str, board_id: &str) -> Result<Board> {
        self.db
            .find_board(board_id, owner_user_id)
            .await?
            .ok_or_else(AppError::board_not_found)
    }

    pub async fn create(&self, owner_user_id: &str, input: CreateBoard) -> Result<Board> {
        let input = input.normalized();
        input.validate()?;

        let board = Board::new(input, owner_user_id);
        self.db.set_board(&board).await?;

        tracing::info!(board_id = %board.id, owner = owner_user_id, "Board created");
        Ok(board)
    }

    /// Partial update; only supplied fields are overwritten.
    pub async fn update(
        &self,
        owner_user_id: &str,
        board_id: &str,
        update: UpdateBoard,
    ) -> Result<Board> {
        let update = update.normalized();
        update.validate()?;

        let mut board = self.get(owner_user_id, board_id).await?;
        if board.apply(update) {
            self.db.set_board(&board).await?;
            tracing::debug!(board_id, "Board updated");
        }
        Ok(board)
    }

    /// Delete the board and every todo on it.
    pub async fn delete(&self, owner_user_id: &str, board_id: &str) -> Result<()> {
        let board = self.get(owner_user_id, board_id).await?;
        let todos_deleted = self.db.delete_board_cascade(&board.id).await?;

        tracing::info!(board_id, todos_deleted, "Board deleted");
        Ok(())
    }
}
