// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client side of the API: a typed HTTP client and a session store that
//! follows the identity provider's signed-in state.

pub mod api;
pub mod session;

pub use api::ApiClient;
pub use session::{
    IdentityStateSource, MemoryTokenStorage, ProviderSession, SessionBackend, SessionState,
    SessionStore, Subscription, TokenStorage,
};

use crate::error::FieldError;

/// Errors seen by API consumers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a failure envelope.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl ClientError {
    /// HTTP status of an API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
