// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod boards;
pub mod identity;
pub mod session;
pub mod todos;
pub mod users;

pub use boards::BoardService;
pub use identity::{FirebaseVerifier, IdentityClaims, IdentityError, IdentityVerifier};
pub use session::{SessionClaims, SessionIssuer};
pub use todos::TodoService;
pub use users::{ClaimSync, UserDirectory};
