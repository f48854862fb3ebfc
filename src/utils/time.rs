//! Time utilities: epoch seconds ⇄ local wall-clock strings at the CLI boundary.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Current instant in epoch seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

fn invalid(input: &str) -> AppError {
    AppError::validation(format!(
        "invalid date/time '{input}' (expected YYYY-MM-DD HH:MM, YYYY-MM-DD or @epoch)"
    ))
}

/// Parse a local date/time into epoch seconds.
///
/// Accepts `YYYY-MM-DD HH:MM` (also with `T` or seconds), a bare date
/// (midnight), or `@<epoch seconds>`.
pub fn parse_local(input: &str, offset_secs: i64) -> AppResult<i64> {
    let s = input.trim();

    if let Some(raw) = s.strip_prefix('@') {
        return raw.parse::<i64>().map_err(|_| invalid(input));
    }

    let naive = INPUT_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| invalid(input))?;

    Ok(naive.and_utc().timestamp() - offset_secs)
}

/// Like [`parse_local`] for a bare date, but at the last second of that day.
pub fn parse_local_end_of_day(input: &str, offset_secs: i64) -> AppResult<i64> {
    match NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        Ok(d) => {
            let start = d.and_time(NaiveTime::MIN).and_utc().timestamp() - offset_secs;
            Ok(start + 86_399)
        }
        Err(_) => parse_local(input, offset_secs),
    }
}

pub fn parse_optional_local(input: Option<&String>, offset_secs: i64) -> AppResult<Option<i64>> {
    input.map(|s| parse_local(s, offset_secs)).transpose()
}

/// `YYYY-MM-DD HH:MM` in the given offset.
pub fn format_local(ts: i64, offset_secs: i64) -> String {
    DateTime::from_timestamp(ts + offset_secs, 0)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("@{ts}"))
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}
