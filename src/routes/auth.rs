// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: exchange a provider token for a session token.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{authenticate_provider, AuthContext, MaybeAuth};
use crate::models::User;
use crate::routes::{ApiJson, ApiResponse};
use crate::services::ClaimSync;
use crate::AppState;

/// Routes reachable without a token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/register", post(register))
}

/// Routes behind `optional_auth`.
pub fn optional_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/status", get(status))
}

/// Routes behind `require_auth`.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/me", get(me))
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub firebase_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user: UserResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Register or log in with a provider ID token.
///
/// Creates the user on first sight and reconciles both verification status
/// and display name, then returns a session token.
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<SessionResponse>> {
    let token = body
        .firebase_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Firebase token is required".to_string()))?;

    let context = authenticate_provider(&state, token.trim(), ClaimSync::Profile).await?;

    tracing::info!(user_id = %context.user.id, "User authenticated");

    Ok(ApiResponse::with_message(
        "Authentication successful",
        SessionResponse {
            user: context.user.into(),
            token: context.session_token,
        },
    ))
}

/// Current user.
async fn me(Extension(context): Extension<AuthContext>) -> ApiResponse<MeResponse> {
    ApiResponse::data(MeResponse {
        user: context.user.into(),
    })
}

/// Whether the request carries a usable token.
async fn status(MaybeAuth(context): MaybeAuth) -> ApiResponse<StatusResponse> {
    ApiResponse::data(StatusResponse {
        authenticated: context.is_some(),
        user: context.map(|c| c.user.into()),
    })
}
