//! Aggregate statistics for the list, calendar and dashboard views.

use crate::day::Day;
use crate::engine::{self, WeekStart};
use crate::models::Habit;

/// How many habits were completed on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    pub day: Day,
    pub completed: usize,
    pub total: usize,
}

impl DayProgress {
    /// Share of habits completed, 0 when there are no habits.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

fn progress_over(habits: &[Habit], window: &[Day]) -> Vec<DayProgress> {
    engine::window_completions(habits, window)
        .into_iter()
        .map(|(day, completed)| DayProgress {
            day,
            completed,
            total: habits.len(),
        })
        .collect()
}

/// Progress for a single day.
pub fn daily_progress(habits: &[Habit], day: Day) -> DayProgress {
    DayProgress {
        day,
        completed: habits.iter().filter(|h| h.is_completed_on(day)).count(),
        total: habits.len(),
    }
}

/// Progress for each day of the week containing `day`.
pub fn weekly_progress(habits: &[Habit], day: Day, week_start: WeekStart) -> Vec<DayProgress> {
    progress_over(habits, &engine::week_containing(day, week_start))
}

/// Progress for the seven days ending at `today`, oldest first.
pub fn last_7_days(habits: &[Habit], today: Day) -> Vec<DayProgress> {
    progress_over(habits, &engine::last_n_days(today, 7))
}

/// A habit with its completion rate rounded and capped at 100 for display.
#[derive(Debug, Clone, Copy)]
pub struct RankedHabit<'a> {
    pub habit: &'a Habit,
    pub rate: u32,
}

fn display_rate(rate: f64) -> u32 {
    rate.round().clamp(0.0, 100.0) as u32
}

/// Up to `limit` habits ordered by completion rate, best first.
///
/// Ties keep collection order.
pub fn top_habits(habits: &[Habit], today: Day, limit: usize) -> Vec<RankedHabit<'_>> {
    let mut ranked: Vec<_> = habits
        .iter()
        .map(|habit| RankedHabit {
            habit,
            rate: display_rate(habit.completion_rate(today)),
        })
        .collect();
    ranked.sort_by(|a, b| b.rate.cmp(&a.rate));
    ranked.truncate(limit);
    ranked
}

/// Totals shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_habits: usize,
    pub total_completions: usize,
    /// Sum of every habit's current streak.
    pub total_streak: u32,
    /// Mean of the unclamped completion rates, rounded.
    pub avg_completion_rate: u32,
    pub last_7_days: Vec<DayProgress>,
}

pub fn dashboard(habits: &[Habit], today: Day) -> DashboardSummary {
    let avg_completion_rate = if habits.is_empty() {
        0
    } else {
        let sum: f64 = habits.iter().map(|h| h.completion_rate(today)).sum();
        (sum / habits.len() as f64).round() as u32
    };

    DashboardSummary {
        total_habits: habits.len(),
        total_completions: habits.iter().map(Habit::total_completions).sum(),
        total_streak: habits.iter().map(Habit::streak).sum(),
        avg_completion_rate,
        last_7_days: last_7_days(habits, today),
    }
}

/// One month laid out for a calendar grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st so it lands under its weekday column.
    pub leading_blanks: usize,
    pub days: Vec<DayProgress>,
}

impl MonthGrid {
    /// Rows of seven cells; `None` marks padding.
    pub fn weeks(&self) -> Vec<[Option<DayProgress>; 7]> {
        let cells: Vec<Option<DayProgress>> = std::iter::repeat(None)
            .take(self.leading_blanks)
            .chain(self.days.iter().copied().map(Some))
            .collect();
        cells
            .chunks(7)
            .map(|chunk| std::array::from_fn(|i| chunk.get(i).copied().flatten()))
            .collect()
    }
}

pub fn month_grid(habits: &[Habit], year: i32, month: u32, week_start: WeekStart) -> MonthGrid {
    let days = engine::month_days(year, month);
    let leading_blanks = days
        .first()
        .map(|first| match week_start {
            WeekStart::Monday => first.weekday().num_days_from_monday(),
            WeekStart::Sunday => first.weekday().num_days_from_sunday(),
        })
        .unwrap_or(0) as usize;

    MonthGrid {
        year,
        month,
        leading_blanks,
        days: progress_over(habits, &days),
    }
}

/// Move `delta` months from (`year`, `month`).
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completions::CompletionSet;
    use crate::models::NewHabit;
    use chrono::{Local, TimeZone};

    fn day(s: &str) -> Day {
        Day::parse(s).unwrap()
    }

    fn habit(name: &str, created: &str, done: &[&str], today: Day) -> Habit {
        let created = day(created).date().and_hms_opt(8, 0, 0).unwrap();
        let created = Local.from_local_datetime(&created).unwrap();
        Habit::create(NewHabit::named(name), created)
            .unwrap()
            .with_completions(CompletionSet::parse_all(done.iter().copied()).unwrap(), today)
    }

    #[test]
    fn test_daily_progress() {
        let today = day("2024-01-05");
        let habits = vec![
            habit("A", "2024-01-01", &["2024-01-05"], today),
            habit("B", "2024-01-01", &["2024-01-04"], today),
        ];
        let progress = daily_progress(&habits, today);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.percentage(), 50.0);

        assert_eq!(daily_progress(&[], today).percentage(), 0.0);
    }

    #[test]
    fn test_weekly_progress_follows_week_start() {
        let today = day("2024-01-03");
        let habits = vec![habit("A", "2024-01-01", &["2023-12-31", "2024-01-01"], today)];

        let monday = weekly_progress(&habits, today, WeekStart::Monday);
        assert_eq!(monday[0].day, day("2024-01-01"));
        assert_eq!(monday[0].completed, 1);
        assert_eq!(monday.iter().map(|p| p.completed).sum::<usize>(), 1);

        let sunday = weekly_progress(&habits, today, WeekStart::Sunday);
        assert_eq!(sunday[0].day, day("2023-12-31"));
        assert_eq!(sunday.iter().map(|p| p.completed).sum::<usize>(), 2);
    }

    #[test]
    fn test_top_habits_order_and_clamp() {
        let today = day("2024-01-04");
        let habits = vec![
            habit("Half", "2024-01-01", &["2024-01-01", "2024-01-02"], today),
            // Created today with a backfilled day: rate 200%, shown as 100.
            habit("Over", "2024-01-04", &["2024-01-03", "2024-01-04"], today),
            habit("None", "2024-01-01", &[], today),
        ];
        let top = top_habits(&habits, today, 10);
        let names: Vec<&str> = top.iter().map(|r| r.habit.name.as_str()).collect();
        assert_eq!(names, ["Over", "Half", "None"]);
        assert_eq!(top[0].rate, 100);
        assert_eq!(top[1].rate, 50);
        assert_eq!(top[2].rate, 0);

        assert_eq!(top_habits(&habits, today, 2).len(), 2);
    }

    #[test]
    fn test_dashboard_totals() {
        let today = day("2024-01-10");
        let habits = vec![
            habit("A", "2024-01-01", &["2024-01-08", "2024-01-09", "2024-01-10"], today),
            habit("B", "2024-01-01", &["2024-01-10"], today),
        ];
        let summary = dashboard(&habits, today);
        assert_eq!(summary.total_habits, 2);
        assert_eq!(summary.total_completions, 4);
        assert_eq!(summary.total_streak, 4);
        // (30% + 10%) / 2
        assert_eq!(summary.avg_completion_rate, 20);
        assert_eq!(summary.last_7_days.len(), 7);
        assert_eq!(summary.last_7_days[6].day, today);
        assert_eq!(summary.last_7_days[6].completed, 2);

        let empty = dashboard(&[], today);
        assert_eq!(empty.avg_completion_rate, 0);
        assert_eq!(empty.total_streak, 0);
    }

    #[test]
    fn test_month_grid_layout() {
        let today = day("2024-02-10");
        let habits = vec![habit("A", "2024-02-01", &["2024-02-01", "2024-02-29"], today)];

        // 2024-02-01 is a Thursday.
        let grid = month_grid(&habits, 2024, 2, WeekStart::Monday);
        assert_eq!(grid.leading_blanks, 3);
        assert_eq!(grid.days.len(), 29);
        let weeks = grid.weeks();
        assert_eq!(weeks.len(), 5);
        assert!(weeks[0][2].is_none());
        assert_eq!(weeks[0][3].map(|p| p.completed), Some(1));
        assert_eq!(weeks[4][3].map(|p| p.day), Some(day("2024-02-29")));
        assert!(weeks[4][4].is_none());

        let grid = month_grid(&habits, 2024, 2, WeekStart::Sunday);
        assert_eq!(grid.leading_blanks, 4);
    }

    #[test]
    fn test_shift_month() {
        assert_eq!(shift_month(2024, 1, -1), (2023, 12));
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(shift_month(2024, 5, 0), (2024, 5));
        assert_eq!(shift_month(2024, 3, -14), (2023, 1));
    }
}
