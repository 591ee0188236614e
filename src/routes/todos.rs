// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Todo routes. Listing and creation are scoped under a board; everything
//! else addresses a todo directly.

use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::models::todo::{CreateTodo, UpdateTodo};
use crate::models::Todo;
use crate::routes::{created, ApiJson, ApiResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Extension, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Parameter name must match `/boards/{id}`.
        .route("/boards/{id}/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

async fn list_todos(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
) -> Result<ApiResponse<Vec<Todo>>> {
    let todos = state.todos.list(&auth.user.id, &board_id).await?;
    Ok(ApiResponse::list(todos))
}

async fn get_todo(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Todo>> {
    let todo = state.todos.get(&auth.user.id, &id).await?;
    Ok(ApiResponse::data(todo))
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
    ApiJson(input): ApiJson<CreateTodo>,
) -> Result<Response> {
    let todo = state.todos.create(&auth.user.id, &board_id, input).await?;
    Ok(created("Todo created successfully", todo))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<UpdateTodo>,
) -> Result<ApiResponse<Todo>> {
    let todo = state.todos.update(&auth.user.id, &id, update).await?;
    Ok(ApiResponse::with_message("Todo updated successfully", todo))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    state.todos.delete(&auth.user.id, &id).await?;
    Ok(ApiResponse::message("Todo deleted successfully"))
}
