// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Taskboard: boards and todos behind Firebase sign-in
//!
//! This crate provides the backend API (identity bridging, board and todo
//! CRUD) and a client-side session store for consumers of that API.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use services::{BoardService, IdentityVerifier, SessionIssuer, TodoService, UserDirectory};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub identity: Arc<dyn IdentityVerifier>,
    pub sessions: SessionIssuer,
    pub users: UserDirectory,
    pub boards: BoardService,
    pub todos: TodoService,
}

impl AppState {
    /// Wire services over a database and identity verifier.
    pub fn new(config: Config, db: Database, identity: Arc<dyn IdentityVerifier>) -> Self {
        let sessions = SessionIssuer::new(&config.jwt_signing_key, config.session_ttl);
        Self {
            users: UserDirectory::new(db.clone()),
            boards: BoardService::new(db.clone()),
            todos: TodoService::new(db.clone()),
            config,
            db,
            identity,
            sessions,
        }
    }
}
