//! Typed data-access interface the core operations are written against.
//!
//! The SQLite implementation lives on `rusqlite::Connection`, so both a plain
//! connection and an open `Transaction` (through deref) can be handed to the
//! core.

use crate::db::log::ttlog;
use crate::db::queries::{
    EVENT_COLUMNS, map_business, map_event, map_member, map_member_profile, map_record, map_user,
};
use crate::errors::{AppError, AppResult};
use crate::models::business::Business;
use crate::models::event::{Event, NewEvent};
use crate::models::member::{Member, MemberProfile, User};
use crate::models::record::Record;
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use std::collections::BTreeMap;

/// Optional restrictions when listing the events of a business.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Only events starting at or after this instant.
    pub from: Option<i64>,
    /// Only events starting at or before this instant.
    pub until: Option<i64>,
    pub tag: Option<String>,
}

pub trait Repository {
    // businesses
    fn insert_business(&self, name: &str, require_join_approval: bool) -> AppResult<Business>;
    fn get_business(&self, id: i64) -> AppResult<Option<Business>>;
    fn business_by_join_code(&self, code: &str) -> AppResult<Option<Business>>;
    /// Replaces the current code in a single statement. A collision with
    /// another business's code is reported as `Conflict`.
    fn set_join_code(&self, business_id: i64, code: &str) -> AppResult<()>;

    // users and members
    fn upsert_user(&self, user: &User) -> AppResult<()>;
    fn get_user(&self, id: &str) -> AppResult<Option<User>>;
    fn upsert_member(&self, member: &Member) -> AppResult<()>;
    fn get_member(&self, business_id: i64, user_id: &str) -> AppResult<Option<Member>>;
    fn member_profiles(&self, business_id: i64) -> AppResult<Vec<MemberProfile>>;
    fn update_custom_data(
        &self,
        business_id: i64,
        user_id: &str,
        data: &BTreeMap<String, String>,
    ) -> AppResult<()>;
    fn insert_join_request(&self, business_id: i64, user_id: &str, now: i64) -> AppResult<()>;
    /// Removes a pending request; `false` when there was none.
    fn take_join_request(&self, business_id: i64, user_id: &str) -> AppResult<bool>;

    // events
    fn insert_event(&self, ev: &NewEvent) -> AppResult<Event>;
    fn get_event(&self, id: i64) -> AppResult<Option<Event>>;
    fn update_event(&self, ev: &Event) -> AppResult<()>;
    fn delete_events(&self, ids: &[i64]) -> AppResult<usize>;
    /// Every instance of a series, ordered by start.
    fn events_by_series(&self, repeat_id: i64) -> AppResult<Vec<Event>>;
    fn events_by_business(&self, business_id: i64, filter: &EventFilter) -> AppResult<Vec<Event>>;
    fn next_series_id(&self) -> AppResult<i64>;

    // records
    fn upsert_record(&self, rec: &Record) -> AppResult<()>;
    fn get_record(&self, event_id: i64, user_id: &str) -> AppResult<Option<Record>>;
    fn records_by_business(&self, business_id: i64) -> AppResult<Vec<Record>>;

    // audit trail
    fn audit(&self, operation: &str, target: &str, message: &str) -> AppResult<()>;
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> AppResult<Vec<T>> {
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

impl Repository for Connection {
    fn insert_business(&self, name: &str, require_join_approval: bool) -> AppResult<Business> {
        self.execute(
            "INSERT INTO businesses (name, require_join_approval) VALUES (?1, ?2)",
            params![name, if require_join_approval { 1 } else { 0 }],
        )?;
        let id = self.last_insert_rowid();
        self.get_business(id)?
            .ok_or_else(|| AppError::not_found("business", id))
    }

    fn get_business(&self, id: i64) -> AppResult<Option<Business>> {
        let mut stmt = self.prepare_cached("SELECT * FROM businesses WHERE id = ?1")?;
        Ok(stmt.query_row([id], map_business).optional()?)
    }

    fn business_by_join_code(&self, code: &str) -> AppResult<Option<Business>> {
        let mut stmt = self.prepare_cached("SELECT * FROM businesses WHERE join_code = ?1")?;
        Ok(stmt.query_row([code], map_business).optional()?)
    }

    fn set_join_code(&self, business_id: i64, code: &str) -> AppResult<()> {
        let updated = self
            .execute(
                "UPDATE businesses SET join_code = ?1 WHERE id = ?2",
                params![code, business_id],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("join code collision for business {business_id}"))
                } else {
                    AppError::Db(e)
                }
            })?;

        if updated == 0 {
            return Err(AppError::not_found("business", business_id));
        }
        Ok(())
    }

    fn upsert_user(&self, user: &User) -> AppResult<()> {
        // ON CONFLICT instead of REPLACE: REPLACE would cascade-delete memberships.
        self.execute(
            "INSERT INTO users (id, email, name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET email = excluded.email, name = excluded.name",
            params![user.id, user.email, user.name],
        )?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let mut stmt = self.prepare_cached("SELECT id, email, name FROM users WHERE id = ?1")?;
        Ok(stmt.query_row([id], map_user).optional()?)
    }

    fn upsert_member(&self, member: &Member) -> AppResult<()> {
        let data = serde_json::to_string(&member.custom_data)?;
        self.execute(
            "INSERT INTO members (business_id, user_id, role, custom_data)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(business_id, user_id)
             DO UPDATE SET role = excluded.role, custom_data = excluded.custom_data",
            params![
                member.business_id,
                member.user_id,
                member.role.to_db_str(),
                data
            ],
        )?;
        Ok(())
    }

    fn get_member(&self, business_id: i64, user_id: &str) -> AppResult<Option<Member>> {
        let mut stmt = self.prepare_cached(
            "SELECT business_id, user_id, role, custom_data FROM members
             WHERE business_id = ?1 AND user_id = ?2",
        )?;
        Ok(stmt
            .query_row(params![business_id, user_id], map_member)
            .optional()?)
    }

    fn member_profiles(&self, business_id: i64) -> AppResult<Vec<MemberProfile>> {
        let mut stmt = self.prepare_cached(
            "SELECT m.business_id, m.user_id, m.role, m.custom_data, u.email, u.name
             FROM members m JOIN users u ON u.id = m.user_id
             WHERE m.business_id = ?1
             ORDER BY u.name ASC, m.user_id ASC",
        )?;
        let rows = stmt.query_map([business_id], map_member_profile)?;
        collect(rows)
    }

    fn update_custom_data(
        &self,
        business_id: i64,
        user_id: &str,
        data: &BTreeMap<String, String>,
    ) -> AppResult<()> {
        let json = serde_json::to_string(data)?;
        let updated = self.execute(
            "UPDATE members SET custom_data = ?1 WHERE business_id = ?2 AND user_id = ?3",
            params![json, business_id, user_id],
        )?;
        if updated == 0 {
            return Err(AppError::not_found("member", user_id));
        }
        Ok(())
    }

    fn insert_join_request(&self, business_id: i64, user_id: &str, now: i64) -> AppResult<()> {
        self.execute(
            "INSERT OR IGNORE INTO join_requests (business_id, user_id, requested_at)
             VALUES (?1, ?2, ?3)",
            params![business_id, user_id, now],
        )?;
        Ok(())
    }

    fn take_join_request(&self, business_id: i64, user_id: &str) -> AppResult<bool> {
        let n = self.execute(
            "DELETE FROM join_requests WHERE business_id = ?1 AND user_id = ?2",
            params![business_id, user_id],
        )?;
        Ok(n > 0)
    }

    fn insert_event(&self, ev: &NewEvent) -> AppResult<Event> {
        self.execute(
            "INSERT INTO events (business_id, name, description, start_ts, end_ts, repeat_id, tag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ev.business_id,
                ev.name,
                ev.description,
                ev.start,
                ev.end,
                ev.repeat_id,
                ev.tag,
            ],
        )?;

        Ok(Event {
            id: self.last_insert_rowid(),
            business_id: ev.business_id,
            name: ev.name.clone(),
            description: ev.description.clone(),
            start: ev.start,
            end: ev.end,
            repeat_id: ev.repeat_id,
            tag: ev.tag.clone(),
        })
    }

    fn get_event(&self, id: i64) -> AppResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
        let mut stmt = self.prepare_cached(&sql)?;
        Ok(stmt.query_row([id], map_event).optional()?)
    }

    fn update_event(&self, ev: &Event) -> AppResult<()> {
        let updated = self.execute(
            "UPDATE events
             SET name = ?1, description = ?2, start_ts = ?3, end_ts = ?4,
                 repeat_id = ?5, tag = ?6
             WHERE id = ?7",
            params![
                ev.name,
                ev.description,
                ev.start,
                ev.end,
                ev.repeat_id,
                ev.tag,
                ev.id,
            ],
        )?;
        if updated == 0 {
            return Err(AppError::not_found("event", ev.id));
        }
        Ok(())
    }

    fn delete_events(&self, ids: &[i64]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        // Build a query with the appropriate number of placeholders
        let mut sql = String::from("DELETE FROM events WHERE id IN (");
        sql.push_str(&vec!["?"; ids.len()].join(","));
        sql.push(')');
        let params_vec: Vec<&dyn ToSql> = ids.iter().map(|i| i as &dyn ToSql).collect();
        let mut stmt = self.prepare(&sql)?;
        Ok(stmt.execute(rusqlite::params_from_iter(params_vec))?)
    }

    fn events_by_series(&self, repeat_id: i64) -> AppResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE repeat_id = ?1 ORDER BY start_ts ASC, id ASC"
        );
        let mut stmt = self.prepare_cached(&sql)?;
        let rows = stmt.query_map([repeat_id], map_event)?;
        collect(rows)
    }

    fn events_by_business(&self, business_id: i64, filter: &EventFilter) -> AppResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE business_id = ?1
               AND (?2 IS NULL OR start_ts >= ?2)
               AND (?3 IS NULL OR start_ts <= ?3)
               AND (?4 IS NULL OR tag = ?4)
             ORDER BY start_ts ASC, id ASC"
        );
        let mut stmt = self.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![business_id, filter.from, filter.until, filter.tag],
            map_event,
        )?;
        collect(rows)
    }

    fn next_series_id(&self) -> AppResult<i64> {
        Ok(self.query_row(
            "SELECT COALESCE(MAX(repeat_id), 0) + 1 FROM events",
            [],
            |row| row.get(0),
        )?)
    }

    fn upsert_record(&self, rec: &Record) -> AppResult<()> {
        let mut stmt = self.prepare_cached(
            "INSERT OR REPLACE INTO records (event_id, business_id, user_id, timestamp, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![
            rec.event_id,
            rec.business_id,
            rec.user_id,
            rec.timestamp,
            rec.status.to_db_str(),
        ])?;
        Ok(())
    }

    fn get_record(&self, event_id: i64, user_id: &str) -> AppResult<Option<Record>> {
        let mut stmt = self.prepare_cached(
            "SELECT event_id, business_id, user_id, timestamp, status FROM records
             WHERE event_id = ?1 AND user_id = ?2",
        )?;
        Ok(stmt
            .query_row(params![event_id, user_id], map_record)
            .optional()?)
    }

    fn records_by_business(&self, business_id: i64) -> AppResult<Vec<Record>> {
        let mut stmt = self.prepare_cached(
            "SELECT event_id, business_id, user_id, timestamp, status FROM records
             WHERE business_id = ?1
             ORDER BY event_id ASC, user_id ASC",
        )?;
        let rows = stmt.query_map([business_id], map_record)?;
        collect(rows)
    }

    fn audit(&self, operation: &str, target: &str, message: &str) -> AppResult<()> {
        ttlog(self, operation, target, message)
    }
}
