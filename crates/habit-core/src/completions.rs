//! The set of days on which a habit was completed.

use crate::day::Day;
use crate::error::HabitResult;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_set;
use std::collections::{BTreeMap, BTreeSet};

/// Days on which a habit was completed, each at most once.
///
/// Values are immutable from the outside; a changed set is produced by
/// [`crate::engine::toggle_completion`]. Serialized as a sorted list of
/// `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletionSet(BTreeSet<Day>);

impl CompletionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of date strings, failing on the first malformed one.
    pub fn parse_all<'a>(dates: impl IntoIterator<Item = &'a str>) -> HabitResult<Self> {
        dates
            .into_iter()
            .map(Day::parse)
            .collect::<HabitResult<BTreeSet<_>>>()
            .map(Self)
    }

    pub fn contains(&self, day: Day) -> bool {
        self.0.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Days in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Day> + '_ {
        self.0.iter().copied()
    }

    /// Most recent completion, if any.
    pub fn latest(&self) -> Option<Day> {
        self.0.last().copied()
    }

    /// Returns `true` if the day was newly inserted.
    pub(crate) fn insert(&mut self, day: Day) -> bool {
        self.0.insert(day)
    }

    /// Returns `true` if the day was present.
    pub(crate) fn remove(&mut self, day: Day) -> bool {
        self.0.remove(&day)
    }
}

impl FromIterator<Day> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = Day>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CompletionSet {
    type Item = &'a Day;
    type IntoIter = btree_set::Iter<'a, Day>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accepted on-disk shapes: the current list form, and the map form
/// `{"2024-01-01": true}` written by the browser version.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCompletions {
    List(Vec<Day>),
    Map(BTreeMap<Day, bool>),
}

impl<'de> Deserialize<'de> for CompletionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredCompletions::deserialize(deserializer)? {
            StoredCompletions::List(days) => days.into_iter().collect(),
            StoredCompletions::Map(map) => map
                .into_iter()
                .filter_map(|(day, done)| done.then_some(day))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HabitError;

    #[test]
    fn test_parse_all_dedupes_and_sorts() {
        let set = CompletionSet::parse_all(["2024-01-03", "2024-01-01", "2024-01-03"]).unwrap();
        assert_eq!(set.len(), 2);
        let days: Vec<String> = set.iter().map(|d| d.to_string()).collect();
        assert_eq!(days, ["2024-01-01", "2024-01-03"]);
        assert_eq!(set.latest(), Day::from_ymd(2024, 1, 3));
    }

    #[test]
    fn test_parse_all_rejects_malformed() {
        let err = CompletionSet::parse_all(["2024-01-01", "Jan 2"]).unwrap_err();
        assert!(matches!(err, HabitError::InvalidDateFormat(s) if s == "Jan 2"));
    }

    #[test]
    fn test_serializes_as_sorted_list() {
        let set = CompletionSet::parse_all(["2024-02-01", "2024-01-31"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["2024-01-31","2024-02-01"]"#);
        let back: CompletionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_deserializes_legacy_map() {
        let json = r#"{"2024-01-02": true, "2024-01-01": true, "2024-01-03": false}"#;
        let set: CompletionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set, CompletionSet::parse_all(["2024-01-01", "2024-01-02"]).unwrap());
    }

    #[test]
    fn test_deserialize_rejects_malformed_entries() {
        assert!(serde_json::from_str::<CompletionSet>(r#"["2024-1-1"]"#).is_err());
        assert!(serde_json::from_str::<CompletionSet>(r#"{"yesterday": true}"#).is_err());
    }
}
