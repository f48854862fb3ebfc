use crate::errors::{AppError, AppResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" => Some(Frequency::Daily),
            "weekly" | "w" => Some(Frequency::Weekly),
            "monthly" | "m" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

/// Where a series stops. Unbounded series are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecurrenceEnd {
    /// Last allowed start, epoch seconds (inclusive).
    Until(i64),
    /// Number of occurrences.
    Count(u32),
}

impl RecurrenceEnd {
    /// Build the bound from the optional inputs a caller supplies.
    pub fn from_parts(until: Option<i64>, count: Option<u32>) -> AppResult<Self> {
        match (until, count) {
            (Some(u), None) => Ok(RecurrenceEnd::Until(u)),
            (None, Some(0)) => Err(AppError::validation(
                "occurrence count must be at least 1",
            )),
            (None, Some(c)) => Ok(RecurrenceEnd::Count(c)),
            (None, None) => Err(AppError::validation(
                "a recurring event needs an end date or an occurrence count",
            )),
            (Some(_), Some(_)) => Err(AppError::validation(
                "specify either an end date or an occurrence count, not both",
            )),
        }
    }
}

/// Expansion-time description of a series. Never persisted per instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    /// 0 = Sunday … 6 = Saturday. Only used by `Weekly`.
    pub days_of_week: BTreeSet<u8>,
    /// Organizer's UTC offset; all calendar arithmetic happens in this local time.
    pub tz_offset_ms: i64,
    pub end: RecurrenceEnd,
}

impl RecurrenceRule {
    pub fn validate(&self) -> AppResult<()> {
        if self.interval < 1 {
            return Err(AppError::validation("interval must be at least 1"));
        }
        if self.frequency == Frequency::Weekly {
            if self.days_of_week.is_empty() {
                return Err(AppError::validation(
                    "a weekly series needs at least one weekday",
                ));
            }
            if let Some(d) = self.days_of_week.iter().find(|d| **d > 6) {
                return Err(AppError::validation(format!(
                    "invalid weekday {d} (expected 0=Sunday … 6=Saturday)"
                )));
            }
        }
        if self.tz_offset_ms.abs() >= 24 * 3600 * 1000 {
            return Err(AppError::validation(format!(
                "timezone offset out of range: {} ms",
                self.tz_offset_ms
            )));
        }
        if let RecurrenceEnd::Count(0) = self.end {
            return Err(AppError::validation("occurrence count must be at least 1"));
        }
        Ok(())
    }
}

/// Breadth of an edit or delete across a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepeatEffect {
    This,
    ThisAndFuture,
    All,
}

impl RepeatEffect {
    /// Wire encoding: 1 = THIS, 2 = THIS_AND_FUTURE, 3 = ALL.
    pub fn from_code(code: u8) -> AppResult<Self> {
        match code {
            1 => Ok(RepeatEffect::This),
            2 => Ok(RepeatEffect::ThisAndFuture),
            3 => Ok(RepeatEffect::All),
            other => Err(AppError::validation(format!(
                "invalid repeat effect {other} (expected 1, 2 or 3)"
            ))),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            RepeatEffect::This => 1,
            RepeatEffect::ThisAndFuture => 2,
            RepeatEffect::All => 3,
        }
    }
}

impl fmt::Display for RepeatEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepeatEffect::This => "THIS",
            RepeatEffect::ThisAndFuture => "THIS_AND_FUTURE",
            RepeatEffect::All => "ALL",
        })
    }
}

/// Parse a comma separated weekday list such as `1,3` or `mon,wed`.
pub fn parse_days_of_week(s: &str) -> AppResult<BTreeSet<u8>> {
    let mut out = BTreeSet::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day = match part.to_lowercase().as_str() {
            "sun" | "sunday" => 0,
            "mon" | "monday" => 1,
            "tue" | "tuesday" => 2,
            "wed" | "wednesday" => 3,
            "thu" | "thursday" => 4,
            "fri" | "friday" => 5,
            "sat" | "saturday" => 6,
            other => other
                .parse::<u8>()
                .ok()
                .filter(|d| *d <= 6)
                .ok_or_else(|| AppError::validation(format!("invalid weekday '{part}'")))?,
        };
        out.insert(day);
    }
    Ok(out)
}
