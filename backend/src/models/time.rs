//! Calendar helpers for yearly series.
//!
//! Observations are keyed by the first day of their year. The model works on a
//! continuous "decimal year" axis so the same code handles sub-annual inputs.

use chrono::{Datelike, NaiveDate};

/// January 1 of `year`, or `None` when the year is outside chrono's range.
pub fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Parse a year cell such as `2015` or `2015.0`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

/// Position of `date` on a continuous year axis (2020-01-01 -> 2020.0).
pub fn decimal_year(date: NaiveDate) -> f64 {
    let days_in_year = if is_leap_year(date.year()) { 366.0 } else { 365.0 };
    date.year() as f64 + (date.ordinal0() as f64) / days_in_year
}

/// The same calendar day `years` later, clamped to Feb 28 for Feb 29 starts.
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let target = date.year().checked_add(years)?;
    date.with_year(target)
        .or_else(|| NaiveDate::from_ymd_opt(target, date.month(), 28))
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
