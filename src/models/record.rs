use super::status::AttendanceStatus;
use serde::Serialize;

/// One attendance record. At most one exists per (event, user); a new
/// write replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub event_id: i64,       // ⇔ records.event_id
    pub business_id: i64,    // ⇔ records.business_id
    pub user_id: String,     // ⇔ records.user_id
    pub timestamp: i64,      // epoch seconds
    pub status: AttendanceStatus,
}

impl Record {
    pub fn new(
        event_id: i64,
        business_id: i64,
        user_id: &str,
        timestamp: i64,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            event_id,
            business_id,
            user_id: user_id.to_string(),
            timestamp,
            status,
        }
    }
}
