//! ANSI color helpers for terminal output.

use crate::models::status::AttendanceStatus;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

pub fn color_for_status(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => GREEN,
        AttendanceStatus::Late => YELLOW,
        AttendanceStatus::Excused => CYAN,
        AttendanceStatus::Absent => RED,
        AttendanceStatus::AbsentSelf => MAGENTA,
        AttendanceStatus::NotApplicable => GREY,
    }
}

pub fn colorize_status(status: AttendanceStatus) -> String {
    format!("{}{}{}", color_for_status(status), status, RESET)
}

/// Grey placeholder for empty cells.
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "--" {
        format!("{GREY}--{RESET}")
    } else {
        value.to_string()
    }
}

/// Attendance rate: green from 90%, yellow from 75%, red below.
pub fn color_for_rate(rate: f64) -> &'static str {
    if rate >= 90.0 {
        GREEN
    } else if rate >= 75.0 {
        YELLOW
    } else {
        RED
    }
}
