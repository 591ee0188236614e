// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Board model and its create/update payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Color assigned to boards created without one.
pub const DEFAULT_BOARD_COLOR: &str = "#3b82f6";

pub const BOARD_TITLE_MAX: usize = 100;

/// Board (workspace) stored in Firestore, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `#RRGGBB`
    pub color: String,
    pub owner_user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /boards`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoard {
    #[validate(
        required(message = "Board title is required"),
        custom(function = "board_title")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(
        max = 500,
        message = "Description cannot exceed 500 characters"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(custom(function = "hex_color"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CreateBoard {
    /// Trim free-text fields before validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }
}

/// Body of `PUT /boards/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoard {
    #[validate(custom(function = "board_title"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(
        max = 500,
        message = "Description cannot exceed 500 characters"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(custom(function = "hex_color"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl UpdateBoard {
    /// Trim free-text fields before validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }
}

impl Board {
    /// Build a new board from a validated payload.
    pub fn new(input: CreateBoard, owner_user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            color: input
                .color
                .unwrap_or_else(|| DEFAULT_BOARD_COLOR.to_string()),
            owner_user_id: owner_user_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated partial update. Returns whether anything changed.
    pub fn apply(&mut self, update: UpdateBoard) -> bool {
        let mut changed = false;

        if let Some(title) = update.title {
            changed |= title != self.title;
            self.title = title;
        }
        if let Some(description) = update.description {
            changed |= description != self.description;
            self.description = description;
        }
        if let Some(color) = update.color {
            changed |= color != self.color;
            self.color = color;
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

fn board_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(
            ValidationError::new("required").with_message("Board title is required".into())
        );
    }
    if title.chars().count() > BOARD_TITLE_MAX {
        return Err(ValidationError::new("length")
            .with_message("Board title cannot exceed 100 characters".into()));
    }
    Ok(())
}

fn hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("color").with_message("Color must be a valid hex color".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str) -> CreateBoard {
        CreateBoard {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let board = Board::new(create("Launch").normalized(), "user-1");
        assert_eq!(board.title, "Launch");
        assert_eq!(board.description, "");
        assert_eq!(board.color, DEFAULT_BOARD_COLOR);
        assert_eq!(board.owner_user_id, "user-1");
    }

    #[test]
    fn test_title_limits() {
        assert!(create(&"a".repeat(100)).normalized().validate().is_ok());
        assert!(create(&"a".repeat(101)).normalized().validate().is_err());
        assert!(create("   ").normalized().validate().is_err());
        assert!(CreateBoard::default().validate().is_err());
    }

    #[test]
    fn test_title_length_counts_characters() {
        // 100 multi-byte characters are still within the limit
        assert!(create(&"é".repeat(100)).normalized().validate().is_ok());
    }

    #[test]
    fn test_color_validation() {
        let mut input = create("Colors");
        input.color = Some("#A1b2C3".to_string());
        assert!(input.clone().validate().is_ok());

        input.color = Some("blue".to_string());
        assert!(input.clone().validate().is_err());

        input.color = Some("#12345".to_string());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut board = Board::new(create("Launch"), "user-1");
        let before = board.updated_at;

        let unchanged = board.apply(UpdateBoard {
            title: Some("Launch".to_string()),
            ..Default::default()
        });
        assert!(!unchanged);
        assert_eq!(board.updated_at, before);

        let changed = board.apply(UpdateBoard {
            color: Some("#000000".to_string()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(board.title, "Launch");
        assert_eq!(board.color, "#000000");
    }
}
