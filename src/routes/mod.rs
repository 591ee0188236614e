// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod boards;
pub mod todos;

use crate::error::{AppError, FieldError};
use crate::middleware::auth::{optional_auth, require_auth};
use crate::AppState;
use axum::extract::{FromRequest, Request};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Success envelope shared by every API response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: &'static str, data: T) -> Self {
        Self {
            message: Some(message),
            ..Self::data(data)
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            ..Self::data(items)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &'static str) -> Self {
        Self {
            success: true,
            message: Some(message),
            count: None,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201 Created` with an envelope.
pub fn created<T: Serialize>(message: &'static str, data: T) -> Response {
    (StatusCode::CREATED, ApiResponse::with_message(message, data)).into_response()
}

/// JSON body extractor whose rejections use the API error envelope.
///
/// Unparseable bodies are a `BadRequest`. A well-formed body with a field of
/// the wrong type is a `Validation` failure naming that field.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        serde_path_to_error::deserialize(value)
            .map(Self)
            .map_err(|err| {
                let field = err.path().to_string();
                tracing::debug!(field = %field, error = %err.inner(), "Rejected request body");
                match field.as_str() {
                    "." => AppError::BadRequest("Request body must be a JSON object".to_string()),
                    _ => AppError::Validation(vec![FieldError::new(
                        field.clone(),
                        wrong_type_message(&field),
                    )]),
                }
            })
    }
}

/// Message for a body field that has the wrong JSON type.
fn wrong_type_message(field: &str) -> String {
    match field {
        "title" => "Title must be a string".to_string(),
        "description" => "Description must be a string".to_string(),
        "color" => "Color must be a valid hex color".to_string(),
        "completed" => "Completed must be a boolean".to_string(),
        "priority" => "Priority must be low, medium, or high".to_string(),
        "dueDate" => "Due date must be a valid ISO 8601 date".to_string(),
        "firebaseToken" => "Firebase token must be a string".to_string(),
        other => format!("{other} has an invalid type"),
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        success: true,
        message: "Server is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        build_id,
    })
}

async fn route_not_found() -> Response {
    AppError::NotFound("Route not found".to_string()).into_response()
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(boards::routes())
        .merge(todos::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Routes that work with or without identity
    let optional_routes = auth::optional_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let api = Router::new()
        .merge(auth::public_routes())
        .merge(optional_routes)
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
