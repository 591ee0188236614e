// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Todo model and its create/update payloads.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::error::{AppError, FieldError};

pub const TODO_TITLE_MAX: usize = 200;

/// Todo priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

/// Todo item stored in Firestore.
///
/// `owner_user_id` duplicates the parent board's owner so todos can be
/// filtered by owner without reading the board first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub board_id: String,
    pub owner_user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /boards/{boardId}/todos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    #[validate(
        required(message = "Todo title is required"),
        custom(function = "todo_title")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(
        max = 1000,
        message = "Description cannot exceed 1000 characters"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[validate(custom(function = "valid_priority"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Body of `PUT /todos/{id}`. Absent fields are left untouched; an explicit
/// `"dueDate": null` clears the due date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[validate(custom(function = "todo_title"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(
        max = 1000,
        message = "Description cannot exceed 1000 characters"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[validate(custom(function = "valid_priority"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
}

impl CreateTodo {
    /// Trim free-text fields before validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }

    /// Validate field constraints, including the due date.
    pub fn check(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let mut errors = field_errors(self.validate());
        let due_date = match self.due_date.as_deref() {
            Some(raw) => parse_due_date(raw).map(Some),
            None => Ok(None),
        };
        collect(&mut errors, due_date)
    }
}

impl UpdateTodo {
    /// Trim free-text fields before validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }

    /// Validate field constraints. The outer `Option` of the result says
    /// whether the due date was supplied at all.
    pub fn check(&self) -> Result<Option<Option<DateTime<Utc>>>, AppError> {
        let mut errors = field_errors(self.validate());
        let due_date = match &self.due_date {
            Some(Some(raw)) => parse_due_date(raw).map(|d| Some(Some(d))),
            Some(None) => Ok(Some(None)),
            None => Ok(None),
        };
        collect(&mut errors, due_date)
    }
}

impl Todo {
    /// Build a new todo from a validated payload.
    pub fn new(
        input: CreateTodo,
        due_date: Option<DateTime<Utc>>,
        board_id: &str,
        owner_user_id: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            completed: input.completed.unwrap_or(false),
            priority: input
                .priority
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            due_date,
            board_id: board_id.to_string(),
            owner_user_id: owner_user_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated partial update. Returns whether anything changed.
    pub fn apply(&mut self, update: UpdateTodo, due_date: Option<Option<DateTime<Utc>>>) -> bool {
        let mut changed = false;

        if let Some(title) = update.title {
            changed |= title != self.title;
            self.title = title;
        }
        if let Some(description) = update.description {
            changed |= description != self.description;
            self.description = description;
        }
        if let Some(completed) = update.completed {
            changed |= completed != self.completed;
            self.completed = completed;
        }
        if let Some(priority) = update.priority.and_then(|p| p.parse().ok()) {
            changed |= priority != self.priority;
            self.priority = priority;
        }
        if let Some(due_date) = due_date {
            changed |= due_date != self.due_date;
            self.due_date = due_date;
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Accept an RFC 3339 timestamp, a local `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// timestamp (taken as UTC), or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, FieldError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| FieldError::new("dueDate", "Due date must be a valid ISO 8601 date"))
}

/// Distinguish `"field": null` (Some(None)) from an absent field (None).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn field_errors(result: Result<(), validator::ValidationErrors>) -> Vec<FieldError> {
    match result.map_err(AppError::from) {
        Err(AppError::Validation(fields)) => fields,
        _ => Vec::new(),
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, extra: Result<T, FieldError>) -> Result<T, AppError> {
    match extra {
        Ok(value) if errors.is_empty() => Ok(value),
        Ok(_) => Err(AppError::Validation(std::mem::take(errors))),
        Err(field) => {
            errors.push(field);
            Err(AppError::Validation(std::mem::take(errors)))
        }
    }
}

fn todo_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(
            ValidationError::new("required").with_message("Todo title is required".into())
        );
    }
    if title.chars().count() > TODO_TITLE_MAX {
        return Err(ValidationError::new("length")
            .with_message("Todo title cannot exceed 200 characters".into()));
    }
    Ok(())
}

fn valid_priority(value: &str) -> Result<(), ValidationError> {
    value.parse::<Priority>().map(|_| ()).map_err(|_| {
        ValidationError::new("priority")
            .with_message("Priority must be low, medium, or high".into())
    })
}
