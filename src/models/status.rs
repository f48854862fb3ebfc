use serde::Serialize;
use std::fmt;

/// Attendance status of a (member, event) pair.
///
/// Every variant except `NotApplicable` can be stored in a record.
/// `NotApplicable` is only ever derived, for events that have not ended yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttendanceStatus {
    #[serde(rename = "PRESENT")]
    Present,
    #[serde(rename = "ABSENT")]
    Absent,
    #[serde(rename = "LATE")]
    Late,
    #[serde(rename = "EXCUSED")]
    Excused,
    #[serde(rename = "ABSENT(self-marked)")]
    AbsentSelf,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl AttendanceStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Excused => "EXCUSED",
            AttendanceStatus::AbsentSelf => "ABSENT(self-marked)",
            AttendanceStatus::NotApplicable => "N/A",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "PRESENT" => Some(AttendanceStatus::Present),
            "ABSENT" => Some(AttendanceStatus::Absent),
            "LATE" => Some(AttendanceStatus::Late),
            "EXCUSED" => Some(AttendanceStatus::Excused),
            "ABSENT(self-marked)" => Some(AttendanceStatus::AbsentSelf),
            "N/A" => Some(AttendanceStatus::NotApplicable),
            _ => None,
        }
    }

    /// Lenient parser for user input: case-insensitive, accepts a few aliases.
    pub fn from_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "present" | "p" => Some(AttendanceStatus::Present),
            "absent" | "a" => Some(AttendanceStatus::Absent),
            "late" | "l" => Some(AttendanceStatus::Late),
            "excused" | "e" => Some(AttendanceStatus::Excused),
            "absent(self-marked)" | "self" | "absent-self" => Some(AttendanceStatus::AbsentSelf),
            "n/a" | "na" => Some(AttendanceStatus::NotApplicable),
            _ => None,
        }
    }

    pub fn is_storable(&self) -> bool {
        !matches!(self, AttendanceStatus::NotApplicable)
    }

    /// ABSENT(self-marked) is an alias of ABSENT when counting.
    pub fn counts_as_absent(&self) -> bool {
        matches!(self, AttendanceStatus::Absent | AttendanceStatus::AbsentSelf)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
