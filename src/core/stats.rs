//! Per-member attendance summaries and timelines.

use crate::core::attendance::resolve;
use crate::core::business::{require_business, require_member};
use crate::db::repository::{EventFilter, Repository};
use crate::errors::AppResult;
use crate::models::event::Event;
use crate::models::member::Role;
use crate::models::record::Record;
use crate::models::status::AttendanceStatus;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub present: usize,
    pub late: usize,
    pub excused: usize,
    /// Includes self-marked absences and events without a record.
    pub absent: usize,
}

impl StatusCounts {
    /// Share of events attended (present or late), in percent.
    pub fn attendance_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.present + self.late) as f64 * 100.0 / self.total as f64
    }
}

/// Count one member's `records` against `events`.
///
/// Records of events outside the set are ignored. An event without a stored
/// record counts as absent, so the four counts always add up to `total`.
pub fn aggregate_member_stats(events: &[Event], records: &[Record]) -> StatusCounts {
    let ids: HashSet<i64> = events.iter().map(|e| e.id).collect();
    let mut counts = StatusCounts {
        total: ids.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    for rec in records
        .iter()
        .filter(|r| ids.contains(&r.event_id) && r.status.is_storable())
    {
        if !seen.insert(rec.event_id) {
            continue;
        }
        match rec.status {
            AttendanceStatus::Present => counts.present += 1,
            AttendanceStatus::Late => counts.late += 1,
            AttendanceStatus::Excused => counts.excused += 1,
            s if s.counts_as_absent() => counts.absent += 1,
            _ => {}
        }
    }

    counts.absent += counts.total - seen.len();
    counts
}

#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub events: EventFilter,
    /// Also count events that have not ended yet, for members who already
    /// have a record for them.
    pub include_upcoming: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberStats {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub counts: StatusCounts,
}

/// One row per member of `business_id`.
pub fn get_member_stats<R: Repository + ?Sized>(
    repo: &R,
    business_id: i64,
    filter: &StatsFilter,
    now: i64,
) -> AppResult<Vec<MemberStats>> {
    require_business(repo, business_id)?;

    let events = repo.events_by_business(business_id, &filter.events)?;
    let mut by_user: HashMap<String, Vec<Record>> = HashMap::new();
    for rec in repo.records_by_business(business_id)? {
        by_user.entry(rec.user_id.clone()).or_default().push(rec);
    }

    let mut out = Vec::new();
    for profile in repo.member_profiles(business_id)? {
        if filter.role.is_some_and(|r| r != profile.member.role) {
            continue;
        }
        let records = by_user
            .remove(&profile.member.user_id)
            .unwrap_or_default();

        let counted: Vec<Event> = events
            .iter()
            .filter(|ev| {
                let rec = records.iter().find(|r| r.event_id == ev.id);
                if filter.include_upcoming {
                    resolve(ev, rec, now) != AttendanceStatus::NotApplicable
                } else {
                    ev.is_concluded(now)
                }
            })
            .cloned()
            .collect();

        out.push(MemberStats {
            counts: aggregate_member_stats(&counted, &records),
            user_id: profile.member.user_id,
            name: profile.name,
            email: profile.email,
            role: profile.member.role,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub event: Event,
    pub status: AttendanceStatus,
    /// When the record was written; `None` for derived statuses.
    pub recorded_at: Option<i64>,
}

/// Resolved status of every matching event for one member, oldest first.
pub fn member_timeline<R: Repository + ?Sized>(
    repo: &R,
    business_id: i64,
    user_id: &str,
    filter: &EventFilter,
    now: i64,
) -> AppResult<Vec<TimelineEntry>> {
    require_business(repo, business_id)?;
    require_member(repo, business_id, user_id)?;

    let mut out = Vec::new();
    for event in repo.events_by_business(business_id, filter)? {
        let record = repo.get_record(event.id, user_id)?;
        out.push(TimelineEntry {
            status: resolve(&event, record.as_ref(), now),
            recorded_at: record.map(|r| r.timestamp),
            event,
        });
    }
    Ok(out)
}
