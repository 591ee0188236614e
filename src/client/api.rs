// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed HTTP client for the `/api/v1` surface.

use super::session::SessionBackend;
use super::ClientError;
use crate::error::FieldError;
use crate::models::board::{CreateBoard, UpdateBoard};
use crate::models::todo::{CreateTodo, UpdateTodo};
use crate::models::{Board, Todo};
use crate::routes::auth::{MeResponse, SessionResponse, UserResponse};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Response envelope as seen by a client.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    firebase_token: &'a str,
}

/// API client. Sends `Authorization: Bearer <token>` once a session token
/// has been set.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api/v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ─── Auth ────────────────────────────────────────────────────

    /// Exchange a provider ID token for a session; the session token is
    /// used for subsequent calls.
    pub async fn register(&self, firebase_token: &str) -> Result<SessionResponse, ClientError> {
        let session: SessionResponse = self
            .send(
                self.request(Method::POST, "/auth/register")
                    .json(&RegisterBody { firebase_token }),
            )
            .await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        let me: MeResponse = self.send(self.request(Method::GET, "/auth/me")).await?;
        Ok(me.user)
    }

    // ─── Boards ──────────────────────────────────────────────────

    pub async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.send(self.request(Method::GET, "/boards")).await
    }

    pub async fn get_board(&self, id: &str) -> Result<Board, ClientError> {
        self.send(self.request(Method::GET, &format!("/boards/{id}")))
            .await
    }

    pub async fn create_board(&self, input: &CreateBoard) -> Result<Board, ClientError> {
        self.send(self.request(Method::POST, "/boards").json(input))
            .await
    }

    pub async fn update_board(&self, id: &str, update: &UpdateBoard) -> Result<Board, ClientError> {
        self.send(
            self.request(Method::PUT, &format!("/boards/{id}"))
                .json(update),
        )
        .await
    }

    pub async fn delete_board(&self, id: &str) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/boards/{id}")))
            .await
    }

    // ─── Todos ───────────────────────────────────────────────────

    pub async fn list_todos(&self, board_id: &str) -> Result<Vec<Todo>, ClientError> {
        self.send(self.request(Method::GET, &format!("/boards/{board_id}/todos")))
            .await
    }

    pub async fn get_todo(&self, id: &str) -> Result<Todo, ClientError> {
        self.send(self.request(Method::GET, &format!("/todos/{id}")))
            .await
    }

    pub async fn create_todo(&self, board_id: &str, input: &CreateTodo) -> Result<Todo, ClientError> {
        self.send(
            self.request(Method::POST, &format!("/boards/{board_id}/todos"))
                .json(input),
        )
        .await
    }

    pub async fn update_todo(&self, id: &str, update: &UpdateTodo) -> Result<Todo, ClientError> {
        self.send(self.request(Method::PUT, &format!("/todos/{id}")).json(update))
            .await
    }

    pub async fn delete_todo(&self, id: &str) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/todos/{id}")))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        self.envelope::<T>(builder)
            .await?
            .data
            .ok_or_else(|| ClientError::UnexpectedResponse("missing data".to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.envelope::<serde_json::Value>(builder).await.map(|_| ())
    }

    /// Send a request and unwrap the envelope, mapping failures to
    /// [`ClientError::Api`].
    async fn envelope<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (message, errors) = match serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            {
                Ok(envelope) => (envelope.message.unwrap_or_default(), envelope.errors),
                Err(_) => (body, Vec::new()),
            };
            tracing::debug!(status = status.as_u16(), %message, "API request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
                errors,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| ClientError::UnexpectedResponse(format!("JSON parse error: {}", e)))?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_default(),
                errors: envelope.errors,
            });
        }
        Ok(envelope)
    }
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn register(&self, provider_token: &str) -> Result<SessionResponse, ClientError> {
        ApiClient::register(self, provider_token).await
    }

    fn clear(&self) {
        self.set_token(None);
    }
}
