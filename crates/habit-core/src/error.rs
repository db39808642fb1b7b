//! Error types for habit tracking.

use crate::models::HabitId;
use thiserror::Error;

/// Errors raised while validating input or applying a store action.
#[derive(Debug, Error)]
pub enum HabitError {
    /// A date string is not a canonical `YYYY-MM-DD` day.
    #[error("Invalid date format: {0:?} (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),

    /// A goal is zero, negative or not a number.
    #[error("Invalid goal: {0:?} (expected a whole number of days >= 1)")]
    InvalidGoal(String),

    /// A habit name is blank.
    #[error("Habit name must not be empty")]
    EmptyHabitName,

    /// No habit with the given id.
    #[error("Habit not found: {0}")]
    NotFound(HabitId),

    /// The change was applied in memory but could not be saved.
    #[error("Changes not saved: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for habit operations.
pub type HabitResult<T> = Result<T, HabitError>;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;
