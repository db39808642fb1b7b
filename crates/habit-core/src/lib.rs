//! # habit-core
//!
//! Domain logic for the habit tracker: a pure streak engine, the habit data
//! model, a reducer-style store that owns the habit collection, and the
//! key-value persistence it saves to.
//!
//! ## Layers
//!
//! - [`engine`] - streak and completion-rate functions. Pure; "today" is a
//!   parameter everywhere.
//! - [`models`] - [`Habit`], [`Goal`], [`NewHabit`].
//! - [`store`] - [`HabitStore`], which applies [`Action`]s, recomputes
//!   derived stats and saves.
//! - [`storage`] - the [`HabitRepository`] trait and its SQLite and
//!   in-memory implementations.
//! - [`summary`] - daily/weekly/monthly aggregates for the views.

pub mod completions;
pub mod day;
pub mod engine;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;
pub mod summary;

pub use completions::CompletionSet;
pub use day::Day;
pub use engine::{HabitStats, WeekStart};
pub use error::{HabitError, HabitResult, StorageError, StorageResult};
pub use models::{Goal, Habit, HabitId, NewHabit};
pub use storage::{HabitRepository, MemoryRepository, SqliteStore};
pub use store::{Action, HabitStore};
