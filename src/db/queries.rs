//! Row → model mapping. Enum columns that fail to parse surface as
//! `FromSqlConversionFailure`, so a corrupt row never turns into a default.

use crate::errors::AppError;
use crate::models::business::Business;
use crate::models::event::Event;
use crate::models::member::{Member, MemberProfile, Role, User};
use crate::models::record::Record;
use crate::models::status::AttendanceStatus;
use rusqlite::{Result, Row};
use std::collections::BTreeMap;

pub const EVENT_COLUMNS: &str =
    "id, business_id, name, description, start_ts, end_ts, repeat_id, tag";

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}

pub fn map_event(row: &Row) -> Result<Event> {
    Ok(Event {
        id: row.get("id")?,
        business_id: row.get("business_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        start: row.get("start_ts")?,
        end: row.get("end_ts")?,
        repeat_id: row.get("repeat_id")?,
        tag: row.get("tag")?,
    })
}

pub fn map_business(row: &Row) -> Result<Business> {
    Ok(Business {
        id: row.get("id")?,
        name: row.get("name")?,
        join_code: row.get("join_code")?,
        require_join_approval: row.get::<_, i32>("require_join_approval")? == 1,
        subscription_id: row.get("subscription_id")?,
    })
}

pub fn map_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        name: row.get("name")?,
    })
}

pub fn map_member(row: &Row) -> Result<Member> {
    let role_str: String = row.get("role")?;
    let role = Role::from_db_str(&role_str)
        .ok_or_else(|| conversion_error(0, AppError::validation(format!("invalid role: {role_str}"))))?;

    let raw: String = row.get("custom_data")?;
    let custom_data: BTreeMap<String, String> =
        serde_json::from_str(&raw).map_err(|e| conversion_error(0, AppError::Json(e)))?;

    Ok(Member {
        business_id: row.get("business_id")?,
        user_id: row.get("user_id")?,
        role,
        custom_data,
    })
}

pub fn map_member_profile(row: &Row) -> Result<MemberProfile> {
    Ok(MemberProfile {
        member: map_member(row)?,
        email: row.get("email")?,
        name: row.get("name")?,
    })
}

pub fn map_record(row: &Row) -> Result<Record> {
    let status_str: String = row.get("status")?;
    let status = AttendanceStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(
            0,
            AppError::validation(format!("invalid status: {status_str}")),
        )
    })?;

    Ok(Record {
        event_id: row.get("event_id")?,
        business_id: row.get("business_id")?,
        user_id: row.get("user_id")?,
        timestamp: row.get("timestamp")?,
        status,
    })
}
