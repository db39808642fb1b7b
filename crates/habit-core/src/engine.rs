//! Streak and completion-rate computation.
//!
//! Every function here is pure: the same inputs always give the same output,
//! and "today" is always passed in rather than read from the clock. The store
//! calls [`derive_stats`] after every mutation of a habit's completions and
//! keeps the result next to the raw data.

use crate::completions::CompletionSet;
use crate::day::Day;
use crate::models::Habit;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Statistics derived from a completion set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HabitStats {
    /// Consecutive completed days ending at today.
    pub streak: u32,
    /// Longest run of consecutive completed days.
    pub longest_streak: u32,
    /// Number of completed days.
    pub total_completions: usize,
}

/// Add `day` if absent, remove it if present.
///
/// Returns a new set; `completions` is left untouched.
pub fn toggle_completion(completions: &CompletionSet, day: Day) -> CompletionSet {
    let mut next = completions.clone();
    if !next.insert(day) {
        next.remove(day);
    }
    next
}

/// Length of the run of completed days ending at `today`.
///
/// Walks the completions newest first; the i-th one counts only if it is
/// exactly `i` days before `today`. A missing `today` gives 0. Completions
/// dated after `today` are skipped, so they can neither stand in for today
/// nor break an otherwise aligned run.
pub fn current_streak(completions: &CompletionSet, today: Day) -> u32 {
    let mut streak = 0;
    for (i, day) in completions
        .iter()
        .rev()
        .skip_while(|day| *day > today)
        .enumerate()
    {
        if today.days_since(day) != i as i64 {
            break;
        }
        streak += 1;
    }
    streak
}

/// Length of the longest run of consecutive days anywhere in the set.
pub fn longest_streak(completions: &CompletionSet) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<Day> = None;

    for day in completions.iter() {
        run = match prev {
            Some(p) if day.days_since(p) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    longest
}

/// Inclusive number of days from `created` to `today`, at least 1.
pub fn days_since_creation(created: Day, today: Day) -> i64 {
    (today.days_since(created) + 1).max(1)
}

/// Completions per elapsed day since creation, as a percentage.
///
/// Not clamped: a value above 100 is passed through for the caller to decide.
pub fn completion_rate(total_completions: usize, created: Day, today: Day) -> f64 {
    total_completions as f64 / days_since_creation(created, today) as f64 * 100.0
}

/// Recompute all derived statistics from scratch.
pub fn derive_stats(completions: &CompletionSet, today: Day) -> HabitStats {
    HabitStats {
        streak: current_streak(completions, today),
        longest_streak: longest_streak(completions),
        total_completions: completions.len(),
    }
}

/// For each day in `window`, in order, the number of habits completed on it.
pub fn window_completions(habits: &[Habit], window: &[Day]) -> Vec<(Day, usize)> {
    window
        .iter()
        .map(|&day| {
            let count = habits
                .iter()
                .filter(|h| h.completions().contains(day))
                .count();
            (day, count)
        })
        .collect()
}

/// First day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

/// The `n` days ending at `today`, oldest first.
pub fn last_n_days(today: Day, n: usize) -> Vec<Day> {
    (0..n as i64).rev().map(|back| today.offset(-back)).collect()
}

/// The seven days of the week containing `day`.
pub fn week_containing(day: Day, start: WeekStart) -> [Day; 7] {
    let into_week = match start {
        WeekStart::Monday => day.weekday().num_days_from_monday(),
        WeekStart::Sunday => day.weekday().num_days_from_sunday(),
    };
    let first = day.offset(-(into_week as i64));
    std::array::from_fn(|i| first.offset(i as i64))
}

/// Every day of the given month, in order. Empty for an invalid month.
pub fn month_days(year: i32, month: u32) -> Vec<Day> {
    let Some(first) = Day::from_ymd(year, month, 1) else {
        return Vec::new();
    };
    std::iter::successors(Some(first), |d| Some(d.succ()))
        .take_while(|d| d.date().month() == month)
        .collect()
}
