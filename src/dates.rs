//! Canonical date handling. Every comparison between stored dates (holidays,
//! due dates, calendar cells) goes through `format_date`, so string equality
//! is safe.

use crate::error::{GradebookError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part (`T...` or a
/// space), which is dropped.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let t = raw.trim();
    let date_part = t
        .split_once('T')
        .map(|(d, _)| d)
        .or_else(|| t.split_once(' ').map(|(d, _)| d))
        .unwrap_or(t);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|e| GradebookError::parse("date", format!("{:?}: {}", raw, e)))
}

pub fn normalize_date(raw: &str) -> Result<String> {
    parse_date(raw).map(format_date)
}

pub fn is_weekend(d: NaiveDate) -> bool {
    matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        GradebookError::validation(format!("invalid year/month: {}-{:02}", year, month))
    })
}

/// The Sunday on or before `d`.
pub fn week_start(d: NaiveDate) -> NaiveDate {
    d - Duration::days(i64::from(d.weekday().num_days_from_sunday()))
}

/// Shift a (year, month) pair by `delta` months.
pub fn add_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + (month as i32 - 1) + delta;
    (zero_based.div_euclid(12), (zero_based.rem_euclid(12) + 1) as u32)
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_iso_timestamps() {
        let d = parse_date("2024-09-03T00:00:00.000Z").expect("parse");
        assert_eq!(format_date(d), "2024-09-03");
        assert!(parse_date("09/03/2024").is_err());
    }

    #[test]
    fn add_months_wraps_years() {
        assert_eq!(add_months(2024, 12, 1), (2025, 1));
        assert_eq!(add_months(2024, 1, -1), (2023, 12));
        assert_eq!(add_months(2024, 5, -17), (2022, 12));
    }

    #[test]
    fn week_start_is_sunday() {
        let d = NaiveDate::from_ymd_opt(2024, 9, 4).expect("date");
        assert_eq!(format_date(week_start(d)), "2024-09-01");
        let sunday = NaiveDate::from_ymd_opt(2024, 9, 1).expect("date");
        assert_eq!(week_start(sunday), sunday);
    }
}
