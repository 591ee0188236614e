// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskboard_api::config::Config;
use taskboard_api::db::{Database, FirestoreDb};
use taskboard_api::routes::create_router;
use taskboard_api::services::{IdentityClaims, IdentityError, IdentityVerifier};
use taskboard_api::AppState;
use tower::ServiceExt;

/// Provider token the fake verifier treats as an outage.
#[allow(dead_code)]
pub const PROVIDER_DOWN_TOKEN: &str = "provider-down";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity verifier backed by a token -> claims table.
#[derive(Default)]
pub struct FakeVerifier {
    tokens: Mutex<HashMap<String, IdentityClaims>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeVerifier {
    /// Register `token` as a valid provider token for `subject`.
    pub fn allow(&self, token: &str, subject: &str, email: &str) {
        self.set(
            token,
            IdentityClaims {
                subject: subject.to_string(),
                email: email.to_string(),
                email_verified: false,
                display_name: None,
            },
        );
    }

    pub fn set(&self, token: &str, claims: IdentityClaims) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), claims);
    }

    /// Number of provider verifications performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token == PROVIDER_DOWN_TOKEN {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("unknown token".to_string()))
    }
}

/// Test app over the in-memory backend.
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub verifier: Arc<FakeVerifier>,
}

/// Create a test app with an in-memory database and a fake verifier that
/// knows the provider tokens `alice-token` and `bob-token`.
pub fn create_test_app() -> TestApp {
    let verifier = Arc::new(FakeVerifier::default());
    verifier.allow("alice-token", "uid-alice", "alice@example.com");
    verifier.allow("bob-token", "uid-bob", "bob@example.com");

    let state = Arc::new(AppState::new(
        Config::test_default(),
        Database::memory(),
        verifier.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        verifier,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Send a request and decode the JSON response.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, token, body).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Create a board as the given user and return its id.
    pub async fn create_board(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/api/v1/boards",
                Some(token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create board failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a todo on a board and return its id.
    pub async fn create_todo(&self, token: &str, board_id: &str, title: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                &format!("/api/v1/boards/{board_id}/todos"),
                Some(token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create todo failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
