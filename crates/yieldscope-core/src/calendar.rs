// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of YieldScope.

//! Calendar keys derived from a record timestamp.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Month abbreviations in calendar order
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Calendar attributes of a single timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CalendarKeys {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// ISO-8601 week number, 1-53
    pub iso_week: u32,
    pub day: NaiveDate,
    /// Monday opening the ISO week that contains `day`
    pub week_start: NaiveDate,
}

impl CalendarKeys {
    /// Total for every valid timestamp
    #[must_use]
    pub fn derive(timestamp: NaiveDateTime) -> Self {
        let day = timestamp.date();
        Self {
            year: day.year(),
            month: day.month(),
            iso_week: day.iso_week().week(),
            day,
            week_start: week_start(day),
        }
    }
}

/// Monday on or before `date`
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Three-letter label for a 1-based month
#[must_use]
pub fn month_label(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_LABELS.get(idx).copied()
}

/// First and last day of a month, or `None` if the month is out of range
#[must_use]
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_derive_plain_day() {
        let keys = CalendarKeys::derive(dt("2024-03-14 17:45:00"));
        assert_eq!(keys.year, 2024);
        assert_eq!(keys.month, 3);
        assert_eq!(keys.iso_week, 11);
        assert_eq!(keys.day, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(keys.week_start, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_iso_week_across_year_boundary() {
        // Friday 2021-01-01 still belongs to week 53 of 2020
        let keys = CalendarKeys::derive(dt("2021-01-01 00:00:00"));
        assert_eq!(keys.year, 2021);
        assert_eq!(keys.iso_week, 53);
        assert_eq!(keys.week_start, NaiveDate::from_ymd_opt(2020, 12, 28).unwrap());

        // Monday 2024-12-30 opens week 1 of 2025
        let keys = CalendarKeys::derive(dt("2024-12-30 08:00:00"));
        assert_eq!(keys.year, 2024);
        assert_eq!(keys.iso_week, 1);
    }

    #[test]
    fn test_week_start_of_monday_is_itself() {
        let monday = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
        assert_eq!(week_start(monday), monday);
        let sunday = NaiveDate::from_ymd_opt(2024, 11, 24).unwrap();
        assert_eq!(week_start(sunday), monday);
    }

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2023, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month_bounds(2023, 13).is_none());
        assert!(month_bounds(2023, 0).is_none());
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(1), Some("Jan"));
        assert_eq!(month_label(12), Some("Dec"));
        assert_eq!(month_label(0), None);
        assert_eq!(month_label(13), None);
    }
}
