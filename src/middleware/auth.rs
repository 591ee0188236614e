// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication gate.
//!
//! Bearer tokens come in two shapes:
//! - HS256 session tokens minted by [`SessionIssuer`](crate::services::SessionIssuer).
//!   These are authoritative: checked locally, no provider round trip.
//! - Anything else is treated as an identity provider (Firebase) ID token,
//!   verified remotely, mapped to a local user (created on first sight) and
//!   answered with a freshly minted session token.
//!
//! A token that claims HS256 but fails session verification is rejected; it
//! never falls through to the provider.

use crate::error::AppError;
use crate::models::User;
use crate::services::{ClaimSync, IdentityClaims, IdentityError};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode_header, Algorithm};
use std::convert::Infallible;
use std::sync::Arc;

/// Resolved identity attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    /// Identity claims (from the provider token, or rebuilt from the stored
    /// user when a session token was presented)
    pub claims: IdentityClaims,
    /// Session token usable for subsequent requests
    pub session_token: String,
}

/// Identity for routes where authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthContext>().cloned()))
    }
}

/// Middleware that requires a valid bearer token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Middleware that attaches an identity when one can be resolved and
/// otherwise lets the request through anonymously.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Continuing without identity");
        }
    }

    next.run(request).await
}

/// Resolve the caller's identity from the `Authorization` header.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AppError> {
    let token = bearer_token(headers)?;

    let is_session_token = decode_header(token)
        .map(|h| h.alg == Algorithm::HS256)
        .unwrap_or(false);

    if is_session_token {
        authenticate_session(state, token).await
    } else {
        authenticate_provider(state, token, ClaimSync::EmailVerified).await
    }
}

/// Verify a provider token, then find-or-create the local user and mint a
/// session token.
pub async fn authenticate_provider(
    state: &AppState,
    token: &str,
    sync: ClaimSync,
) -> Result<AuthContext, AppError> {
    let claims = state.identity.verify(token).await.map_err(|err| {
        match &err {
            IdentityError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Rejected identity provider token");
            }
            IdentityError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "Identity provider unavailable");
            }
        }
        AppError::InvalidToken
    })?;

    let user = state.users.resolve(&claims, sync).await?;

    let session_token = state
        .sessions
        .issue(&user)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    Ok(AuthContext {
        user,
        claims,
        session_token,
    })
}

async fn authenticate_session(state: &AppState, token: &str) -> Result<AuthContext, AppError> {
    let session = state.sessions.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    let user = state
        .users
        .get(&session.sub)
        .await?
        .filter(|u| u.external_subject_id == session.uid)
        .ok_or_else(|| {
            tracing::warn!(user_id = %session.sub, "Session token for unknown user");
            AppError::InvalidToken
        })?;

    let claims = IdentityClaims {
        subject: user.external_subject_id.clone(),
        email: user.email.clone(),
        email_verified: user.email_verified,
        display_name: user.display_name.clone(),
    };

    Ok(AuthContext {
        user,
        claims,
        session_token: token.to_string(),
    })
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::MissingCredential)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => Ok(token),
        _ => Err(AppError::MissingCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_token_accepts_exact_form() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn bearer_token_rejects_malformed_headers() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::MissingCredential)
        ));
        for value in ["Basic abc", "Bearer ", "bearer abc", "Bearer a b", "Bearerabc"] {
            assert!(
                matches!(bearer_token(&headers(value)), Err(AppError::MissingCredential)),
                "{value} should be rejected"
            );
        }
    }
}
