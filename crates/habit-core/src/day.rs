//! Calendar days at local-clock granularity.

use crate::error::{HabitError, HabitResult};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Write};
use std::str::FromStr;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day with no time-of-day component.
///
/// Constructed either from a [`NaiveDate`] or by parsing a canonical
/// `YYYY-MM-DD` string. Parsing checks the exact shape of the string before
/// handing it to chrono, so `2024-1-5` or `2024-01-05T10:00` are rejected
/// rather than coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    /// Today according to the local clock.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Build a day from year, month and day-of-month.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a canonical `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> HabitResult<Self> {
        if !has_canonical_shape(s) {
            return Err(HabitError::InvalidDateFormat(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DAY_FORMAT)
            .map(Self)
            .map_err(|_| HabitError::InvalidDateFormat(s.to_string()))
    }

    /// The underlying date.
    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The day `days` days after this one (negative goes back).
    pub fn offset(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// The previous day.
    pub fn pred(self) -> Self {
        self.offset(-1)
    }

    /// The next day.
    pub fn succ(self) -> Self {
        self.offset(1)
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(self, earlier: Day) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Format with a chrono format string.
    ///
    /// An invalid format string gives the canonical `YYYY-MM-DD` form.
    pub fn format(self, fmt: &str) -> String {
        let mut out = String::new();
        if write!(out, "{}", self.0.format(fmt)).is_err() {
            return self.to_string();
        }
        out
    }
}

fn has_canonical_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for Day {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Day::parse(&s).map_err(serde::de::Error::custom)
    }
}
