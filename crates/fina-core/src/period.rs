//! Calendar month arithmetic
//!
//! Budget entries are keyed by (month, year). All lookback and projection
//! loops go through `YearMonth` so year boundaries roll over in one place.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month (month is always 1..=12)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Build a month, returning `None` when `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month according to the local clock
    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Shift by a signed number of months
    pub fn offset(&self, months: i64) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) + months;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn prev(&self) -> Self {
        self.offset(-1)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// The `count` months before this one, most recent first (this month excluded)
    pub fn trailing(&self, count: u32) -> impl Iterator<Item = YearMonth> {
        let start = *self;
        (1..=count as i64).map(move |i| start.offset(-i))
    }

    /// The `count` months ending at this one (inclusive), oldest first
    pub fn window_ending(&self, count: u32) -> impl Iterator<Item = YearMonth> {
        let end = *self;
        (0..count as i64).rev().map(move |i| end.offset(-i))
    }

    /// The `count` months after this one, nearest first
    pub fn upcoming(&self, count: u32) -> impl Iterator<Item = YearMonth> {
        let start = *self;
        (1..=count as i64).map(move |i| start.offset(i))
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(YearMonth::new(2024, 0).is_none());
        assert!(YearMonth::new(2024, 13).is_none());
        assert!(YearMonth::new(2024, 12).is_some());
    }

    #[test]
    fn test_prev_wraps_to_december() {
        assert_eq!(ym(2024, 1).prev(), ym(2023, 12));
        assert_eq!(ym(2024, 3).prev(), ym(2024, 2));
    }

    #[test]
    fn test_next_wraps_to_january() {
        assert_eq!(ym(2023, 12).next(), ym(2024, 1));
        assert_eq!(ym(2024, 11).offset(14), ym(2026, 1));
        assert_eq!(ym(2024, 2).offset(-26), ym(2021, 12));
    }

    #[test]
    fn test_trailing_excludes_current() {
        let months: Vec<_> = ym(2024, 2).trailing(3).collect();
        assert_eq!(months, vec![ym(2024, 1), ym(2023, 12), ym(2023, 11)]);
    }

    #[test]
    fn test_window_ending_is_oldest_first() {
        let months: Vec<_> = ym(2024, 1).window_ending(3).collect();
        assert_eq!(months, vec![ym(2023, 11), ym(2023, 12), ym(2024, 1)]);
        assert_eq!(ym(2024, 1).window_ending(0).count(), 0);
    }

    #[test]
    fn test_upcoming() {
        let months: Vec<_> = ym(2023, 11).upcoming(3).collect();
        assert_eq!(months, vec![ym(2023, 12), ym(2024, 1), ym(2024, 2)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ym(2024, 3).to_string(), "03/2024");
    }
}
