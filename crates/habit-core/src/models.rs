//! Data models for habit tracking.

use crate::completions::CompletionSet;
use crate::day::Day;
use crate::engine::{self, HabitStats};
use crate::error::{HabitError, HabitResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique habit identifier.
pub type HabitId = Uuid;

/// Display colors offered for new habits.
pub const COLORS: [&str; 8] = [
    "#6366f1", "#8b5cf6", "#ec4899", "#f59e0b", "#10b981", "#3b82f6", "#ef4444", "#14b8a6",
];

/// Icons offered for new habits.
pub const ICONS: [&str; 10] = ["✓", "💪", "📚", "🏃", "🧘", "💧", "🍎", "📱", "🎯", "⭐"];

/// Target number of days for a habit. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Goal(u32);

impl Goal {
    pub const DEFAULT: Goal = Goal(31);

    /// Validate a numeric goal.
    pub fn new(days: i64) -> HabitResult<Self> {
        u32::try_from(days)
            .ok()
            .filter(|d| *d >= 1)
            .map(Self)
            .ok_or_else(|| HabitError::InvalidGoal(days.to_string()))
    }

    /// Parse user input. Non-numeric input is rejected, never coerced.
    pub fn parse(input: &str) -> HabitResult<Self> {
        input
            .trim()
            .parse::<i64>()
            .map_err(|_| HabitError::InvalidGoal(input.to_string()))
            .and_then(Self::new)
    }

    pub fn days(self) -> u32 {
        self.0
    }
}

impl Default for Goal {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Goal {
    type Error = HabitError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<Goal> for u32 {
    fn from(goal: Goal) -> Self {
        goal.0
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trim a habit name, rejecting blank input.
pub fn validate_name(name: &str) -> HabitResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitError::EmptyHabitName);
    }
    Ok(trimmed.to_string())
}

/// A request to create a habit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewHabit {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub goal: Option<Goal>,
}

impl NewHabit {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// A habit to track.
///
/// The completion set is the only source of truth. Streak fields are a cache
/// produced by the streak engine and are replaced wholesale whenever the
/// completions change; they cannot be set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier.
    #[serde(deserialize_with = "id_or_fresh")]
    pub id: HabitId,
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Display icon.
    pub icon: String,
    /// Target number of days.
    #[serde(default, deserialize_with = "stored_goal")]
    pub goal: Goal,
    /// When the habit was created.
    pub created_at: DateTime<Local>,
    completions: CompletionSet,
    #[serde(flatten)]
    stats: HabitStats,
}

impl Habit {
    /// Build a habit from a creation request.
    ///
    /// `color` and `icon` fall back to the first palette entries.
    pub fn create(request: NewHabit, created_at: DateTime<Local>) -> HabitResult<Self> {
        let name = validate_name(&request.name)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            color: request.color.unwrap_or_else(|| COLORS[0].to_string()),
            icon: request.icon.unwrap_or_else(|| ICONS[0].to_string()),
            goal: request.goal.unwrap_or_default(),
            created_at,
            completions: CompletionSet::new(),
            stats: HabitStats::default(),
        })
    }

    /// Replace the completions and recompute the derived stats.
    pub fn with_completions(mut self, completions: CompletionSet, today: Day) -> Self {
        self.completions = completions;
        self.recompute(today);
        self
    }

    pub fn completions(&self) -> &CompletionSet {
        &self.completions
    }

    pub fn stats(&self) -> HabitStats {
        self.stats
    }

    pub fn streak(&self) -> u32 {
        self.stats.streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.stats.longest_streak
    }

    pub fn total_completions(&self) -> usize {
        self.stats.total_completions
    }

    /// Creation day, for age calculations.
    pub fn created_on(&self) -> Day {
        Day::from(self.created_at.date_naive())
    }

    pub fn is_completed_on(&self, day: Day) -> bool {
        self.completions.contains(day)
    }

    /// Completion rate since creation, as an unclamped percentage.
    pub fn completion_rate(&self, today: Day) -> f64 {
        engine::completion_rate(self.stats.total_completions, self.created_on(), today)
    }

    /// Toggle a day and recompute every derived field.
    pub(crate) fn toggle(&mut self, day: Day, today: Day) {
        self.completions = engine::toggle_completion(&self.completions, day);
        self.recompute(today);
    }

    /// Recompute derived fields. Returns `true` if the cached values changed.
    pub(crate) fn recompute(&mut self, today: Day) -> bool {
        let fresh = engine::derive_stats(&self.completions, today);
        let changed = fresh != self.stats;
        self.stats = fresh;
        changed
    }
}

/// Namespace for ids derived from browser-era habit ids.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x5f0c_2a3e_9b71_4d6a_8e42_c1d7_3b90_a6f4);

/// Ids written by the browser version are timestamps, not UUIDs. Those map
/// to a name-based UUID so the same record always gets the same id.
fn id_or_fresh<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HabitId, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(Uuid::parse_str(&raw)
        .unwrap_or_else(|_| Uuid::new_v5(&LEGACY_ID_NAMESPACE, raw.as_bytes())))
}

/// The browser version stores `0` for a cleared goal and shows it as the
/// default; stored goals below 1 load as [`Goal::DEFAULT`].
fn stored_goal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Goal, D::Error> {
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|days| Goal::new(days).ok()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn day(s: &str) -> Day {
        Day::parse(s).unwrap()
    }

    #[test]
    fn test_habit_creation() {
        let habit = Habit::create(NewHabit::named("  Read  "), noon(2024, 1, 1)).unwrap();
        assert_eq!(habit.name, "Read");
        assert_eq!(habit.goal.days(), 31);
        assert_eq!(habit.color, COLORS[0]);
        assert_eq!(habit.icon, ICONS[0]);
        assert!(habit.completions().is_empty());
        assert_eq!(habit.stats(), HabitStats::default());
        assert_eq!(habit.created_on(), day("2024-01-01"));
    }

    #[test]
    fn test_habit_creation_rejects_blank_name() {
        for name in ["", "   ", "\t\n"] {
            let err = Habit::create(NewHabit::named(name), noon(2024, 1, 1)).unwrap_err();
            assert!(matches!(err, HabitError::EmptyHabitName));
        }
    }

    #[test]
    fn test_goal_validation() {
        assert_eq!(Goal::parse("21").unwrap().days(), 21);
        assert_eq!(Goal::parse(" 7 ").unwrap().days(), 7);
        assert!(matches!(Goal::parse("0"), Err(HabitError::InvalidGoal(_))));
        assert!(matches!(Goal::parse("-3"), Err(HabitError::InvalidGoal(_))));
        assert!(matches!(Goal::parse("lots"), Err(HabitError::InvalidGoal(_))));
        assert!(matches!(Goal::parse(""), Err(HabitError::InvalidGoal(_))));
        assert!(Goal::new(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_toggle_recomputes_everything() {
        let mut habit = Habit::create(NewHabit::named("Run"), noon(2024, 1, 1)).unwrap();
        let today = day("2024-01-03");

        habit.toggle(day("2024-01-02"), today);
        habit.toggle(day("2024-01-03"), today);
        assert_eq!(habit.streak(), 2);
        assert_eq!(habit.longest_streak(), 2);
        assert_eq!(habit.total_completions(), 2);

        habit.toggle(day("2024-01-02"), today);
        assert_eq!(habit.streak(), 1);
        assert_eq!(habit.longest_streak(), 1);
        assert_eq!(habit.total_completions(), 1);
    }

    #[test]
    fn test_completion_rate_uses_creation_day() {
        let today = day("2024-01-10");
        let completions: CompletionSet = (0..10).map(|n| today.offset(-n)).collect();
        let habit = Habit::create(NewHabit::named("Meditate"), noon(2024, 1, 1))
            .unwrap()
            .with_completions(completions, today);
        assert_eq!(habit.completion_rate(today), 100.0);
    }

    #[test]
    fn test_json_shape() {
        let habit = Habit::create(NewHabit::named("Water").with_goal(Goal::new(10).unwrap()), noon(2024, 1, 1))
            .unwrap()
            .with_completions(
                CompletionSet::parse_all(["2024-01-01", "2024-01-02"]).unwrap(),
                day("2024-01-02"),
            );
        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["goal"], 10);
        assert_eq!(value["completions"][1], "2024-01-02");
        assert_eq!(value["streak"], 2);
        assert_eq!(value["longestStreak"], 2);
        assert_eq!(value["totalCompletions"], 2);

        let back: Habit = serde_json::from_value(value).unwrap();
        assert_eq!(back, habit);
    }

    #[test]
    fn test_deserializes_browser_record() {
        let json = r##"{
            "id": "1704103200000",
            "name": "Stretch",
            "color": "#ec4899",
            "icon": "🧘",
            "goal": 31,
            "createdAt": "2024-01-01T10:00:00.000Z",
            "completions": {"2024-01-01": true, "2024-01-02": true},
            "streak": 0,
            "longestStreak": 2,
            "totalCompletions": 2
        }"##;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.name, "Stretch");
        assert_eq!(habit.completions().len(), 2);
        assert_eq!(habit.total_completions(), 2);
    }

    #[test]
    fn test_stored_cleared_goal_loads_as_default() {
        let json = r#"[
            {"id": "1704103200000", "name": "Cleared", "color": "c", "icon": "i", "goal": 0,
             "createdAt": "2024-01-01T10:00:00Z", "completions": {}},
            {"id": "1704103200001", "name": "Set", "color": "c", "icon": "i", "goal": 12,
             "createdAt": "2024-01-01T10:00:00Z", "completions": {"2024-01-01": true}},
            {"id": "1704103200002", "name": "Missing", "color": "c", "icon": "i",
             "createdAt": "2024-01-01T10:00:00Z", "completions": []}
        ]"#;
        let habits: Vec<Habit> = serde_json::from_str(json).unwrap();
        assert_eq!(habits.len(), 3);
        assert_eq!(habits[0].goal, Goal::DEFAULT);
        assert_eq!(habits[1].goal.days(), 12);
        assert_eq!(habits[2].goal, Goal::DEFAULT);
    }

    #[test]
    fn test_legacy_ids_are_stable() {
        let json = r#"{
            "id": "1704103200000", "name": "n", "color": "c", "icon": "i",
            "createdAt": "2024-01-01T10:00:00Z", "completions": []
        }"#;
        let first: Habit = serde_json::from_str(json).unwrap();
        let second: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(first.id, second.id);

        let other = json.replace("1704103200000", "1704103200001");
        let other: Habit = serde_json::from_str(&other).unwrap();
        assert_ne!(first.id, other.id);

        let uuid = Uuid::new_v4();
        let current = json.replace("1704103200000", &uuid.to_string());
        let current: Habit = serde_json::from_str(&current).unwrap();
        assert_eq!(current.id, uuid);
    }
}
