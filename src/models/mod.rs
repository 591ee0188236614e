// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod board;
pub mod todo;
pub mod user;

pub use board::Board;
pub use todo::{Priority, Todo};
pub use user::User;
