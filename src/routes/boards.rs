// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Board routes.

use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::models::board::{CreateBoard, UpdateBoard};
use crate::models::Board;
use crate::routes::{created, ApiJson, ApiResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Extension, Router,
};
use std::sync::Arc;

/// Board routes (auth middleware applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route(
            "/boards/{id}",
            get(get_board).put(update_board).delete(delete_board),
        )
}

async fn list_boards(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<Vec<Board>>> {
    let boards = state.boards.list(&auth.user.id).await?;
    Ok(ApiResponse::list(boards))
}

async fn get_board(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Board>> {
    let board = state.boards.get(&auth.user.id, &id).await?;
    Ok(ApiResponse::data(board))
}

async fn create_board(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<CreateBoard>,
) -> Result<Response> {
    let board = state.boards.create(&auth.user.id, input).await?;
    Ok(created("Board created successfully", board))
}

async fn update_board(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<UpdateBoard>,
) -> Result<ApiResponse<Board>> {
    let board = state.boards.update(&auth.user.id, &id, update).await?;
    Ok(ApiResponse::with_message("Board updated successfully", board))
}

async fn delete_board(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    state.boards.delete(&auth.user.id, &id).await?;
    Ok(ApiResponse::message(
        "Board and all its todos deleted successfully",
    ))
}
