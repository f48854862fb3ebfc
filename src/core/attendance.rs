//! Check-ins, self-reported absences and bulk corrections, plus the single
//! place where a missing record turns into a status.

use crate::core::business::{require_event, require_member};
use crate::core::join_code::authorize_scan;
use crate::core::notify::Notifier;
use crate::db::pool::DbPool;
use crate::db::repository::Repository;
use crate::db::ttl_store::TtlStore;
use crate::errors::{AppError, AppResult};
use crate::models::event::Event;
use crate::models::record::Record;
use crate::models::status::AttendanceStatus;
use serde::Serialize;

/// Effective status of one member for one event.
///
/// A stored record always wins. Without one the member is `N/A` until the
/// event ends and `ABSENT` from then on.
pub fn resolve(event: &Event, record: Option<&Record>, now: i64) -> AttendanceStatus {
    match record {
        Some(r) => r.status,
        None if event.is_concluded(now) => AttendanceStatus::Absent,
        None => AttendanceStatus::NotApplicable,
    }
}

/// Status a scan at `now` earns: `LATE` past the grace period, `PRESENT` otherwise.
pub fn scan_status(event: &Event, now: i64, late_after_minutes: Option<u32>) -> AttendanceStatus {
    match late_after_minutes {
        Some(m) if now > event.start + i64::from(m) * 60 => AttendanceStatus::Late,
        _ => AttendanceStatus::Present,
    }
}

fn write_scan<R: Repository + ?Sized>(
    repo: &R,
    event: &Event,
    user_id: &str,
    now: i64,
    late_after_minutes: Option<u32>,
) -> AppResult<Record> {
    require_member(repo, event.business_id, user_id)?;

    let status = scan_status(event, now, late_after_minutes);
    let record = Record::new(event.id, event.business_id, user_id, now, status);
    repo.upsert_record(&record)?;
    repo.audit(
        "scan",
        user_id,
        &format!("{} for event {}", status, event.id),
    )?;
    Ok(record)
}

/// Check `user_id` in to `event_id`, replacing any earlier record.
pub fn record_scan(
    pool: &mut DbPool,
    event_id: i64,
    user_id: &str,
    now: i64,
    late_after_minutes: Option<u32>,
) -> AppResult<Record> {
    pool.transaction(|repo| {
        let event = require_event(repo, event_id)?;
        write_scan(repo, &event, user_id, now, late_after_minutes)
    })
}

/// Like [`record_scan`], but only while `code` is a live scan code of the
/// event's business.
pub fn record_scan_with_code(
    pool: &mut DbPool,
    store: &dyn TtlStore,
    code: &str,
    event_id: i64,
    user_id: &str,
    now: i64,
    late_after_minutes: Option<u32>,
) -> AppResult<Record> {
    pool.transaction(|repo| {
        authorize_scan(repo, store, code, event_id, now)?;
        let event = require_event(repo, event_id)?;
        write_scan(repo, &event, user_id, now, late_after_minutes)
    })
}

/// A member declares they will not attend. Allowed at any time, before or
/// after the event; the business is notified once the record is stored.
pub fn mark_absent_self(
    pool: &mut DbPool,
    notifier: &dyn Notifier,
    event_id: i64,
    user_id: &str,
    now: i64,
) -> AppResult<Record> {
    let (event, record) = pool.transaction(|repo| {
        let event = require_event(repo, event_id)?;
        require_member(repo, event.business_id, user_id)?;

        let record = Record::new(
            event.id,
            event.business_id,
            user_id,
            now,
            AttendanceStatus::AbsentSelf,
        );
        repo.upsert_record(&record)?;
        repo.audit(
            "absent_self",
            user_id,
            &format!("Self-reported absence for event {}", event.id),
        )?;
        Ok((event, record))
    })?;

    notifier.absence_reported(&event, &record);
    Ok(record)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlterFailure {
    pub event_id: i64,
    pub user_id: String,
    pub reason: String,
}

/// Per-item outcome of [`bulk_alter`].
#[derive(Debug, Default, Serialize)]
pub struct BulkAlterReport {
    pub succeeded: Vec<Record>,
    pub failed: Vec<AlterFailure>,
}

/// Set `status` for every (event, user) pair.
///
/// Unknown events and non-members fail individually; everything else is
/// written in one transaction.
pub fn bulk_alter(
    pool: &mut DbPool,
    event_ids: &[i64],
    user_ids: &[String],
    status: AttendanceStatus,
    now: i64,
) -> AppResult<BulkAlterReport> {
    if !status.is_storable() {
        return Err(AppError::validation(format!(
            "{status} is derived and cannot be stored"
        )));
    }

    pool.transaction(|repo| {
        let mut report = BulkAlterReport::default();

        for &event_id in event_ids {
            let event = match require_event(repo, event_id) {
                Ok(ev) => ev,
                Err(e) if e.is_not_found() => {
                    report.failed.extend(user_ids.iter().map(|u| AlterFailure {
                        event_id,
                        user_id: u.clone(),
                        reason: e.to_string(),
                    }));
                    continue;
                }
                Err(e) => return Err(e),
            };

            for user_id in user_ids {
                match require_member(repo, event.business_id, user_id) {
                    Ok(_) => {
                        let rec = Record::new(event.id, event.business_id, user_id, now, status);
                        repo.upsert_record(&rec)?;
                        report.succeeded.push(rec);
                    }
                    Err(e) if e.is_not_found() => report.failed.push(AlterFailure {
                        event_id,
                        user_id: user_id.clone(),
                        reason: e.to_string(),
                    }),
                    Err(e) => return Err(e),
                }
            }
        }

        repo.audit(
            "alter",
            &status.to_string(),
            &format!(
                "{} record(s) altered, {} failed",
                report.succeeded.len(),
                report.failed.len()
            ),
        )?;
        Ok(report)
    })
}
