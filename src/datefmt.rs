//! Date and time display helpers.
//!
//! Profile forms hand in day/month/year as separate integers; message lists
//! need compact relative timestamps. Nothing here touches chat state.

use chrono::{DateTime, NaiveDate, TimeZone};
use std::fmt::Display;
use thiserror::Error;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("month {0} is not between 1 and 12")]
    InvalidMonth(u32),

    #[error("day {day} does not exist in {month}/{year}")]
    InvalidDay { day: u32, month: u32, year: i32 },

    #[error("year {0} is outside 1900..=2100")]
    YearOutOfRange(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// 16/10/2026
    Numeric,
    /// 16 October 2026
    Long,
    /// 2026-10-16
    Iso,
}

pub fn validate_date(day: u32, month: u32, year: i32) -> Result<NaiveDate, DateError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DateError::YearOutOfRange(year));
    }
    if !(1..=12).contains(&month) {
        return Err(DateError::InvalidMonth(month));
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidDay { day, month, year })
}

pub fn format_date(day: u32, month: u32, year: i32, format: DateFormat) -> Result<String, DateError> {
    let date = validate_date(day, month, year)?;
    Ok(render_date(date, format))
}

/// Like [`format_date`] but falls back to `fallback` for invalid input
pub fn display_date(day: u32, month: u32, year: i32, format: DateFormat, fallback: &str) -> String {
    format_date(day, month, year, format).unwrap_or_else(|_| fallback.to_string())
}

pub fn render_date(date: NaiveDate, format: DateFormat) -> String {
    match format {
        DateFormat::Numeric => date.format("%d/%m/%Y").to_string(),
        DateFormat::Long => date.format("%-d %B %Y").to_string(),
        DateFormat::Iso => date.format("%Y-%m-%d").to_string(),
    }
}

/// Compact timestamp for conversation lists and message bubbles:
/// `14:05` today, `Yesterday`, the weekday within the last week, else the date.
pub fn format_message_time<Tz>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let day = timestamp.date_naive();
    let today = now.date_naive();
    let days_ago = today.signed_duration_since(day).num_days();

    match days_ago {
        0 => timestamp.format("%H:%M").to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => timestamp.format("%A").to_string(),
        _ => render_date(day, DateFormat::Numeric),
    }
}
