//! Series expansion and scoped edit/delete planning.
//!
//! Everything here is pure: callers load the series, ask for a plan, and
//! write the plan back inside one transaction.

use crate::errors::{AppError, AppResult};
use crate::models::event::{Event, EventDelta, NewEvent};
use crate::models::recurrence::{Frequency, RecurrenceEnd, RecurrenceRule, RepeatEffect};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

fn to_local(ts: i64, offset_secs: i64) -> AppResult<NaiveDateTime> {
    DateTime::from_timestamp(ts + offset_secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| AppError::validation(format!("timestamp out of range: {ts}")))
}

fn to_epoch(local: NaiveDateTime, offset_secs: i64) -> i64 {
    local.and_utc().timestamp() - offset_secs
}

/// Candidate local start times, in order, starting at `first`.
/// The sequence is unbounded; the caller applies the end bound.
fn local_starts(
    rule: &RecurrenceRule,
    first: NaiveDateTime,
) -> AppResult<Box<dyn Iterator<Item = NaiveDateTime>>> {
    let interval = u64::from(rule.interval);
    let time = first.time();
    let date = first.date();

    let iter: Box<dyn Iterator<Item = NaiveDateTime>> = match rule.frequency {
        Frequency::Daily => Box::new(
            (0u64..)
                .map_while(move |k| date.checked_add_days(Days::new(k * interval)))
                .map(move |d| d.and_time(time)),
        ),

        Frequency::Weekly => {
            // Weeks are counted from the Sunday-based week holding the first date;
            // only every `interval`-th week can contain occurrences.
            let back = u64::from(date.weekday().num_days_from_sunday());
            let week_start = date
                .checked_sub_days(Days::new(back))
                .ok_or_else(|| AppError::validation("series start out of range"))?;
            let days: Vec<u64> = rule.days_of_week.iter().map(|d| u64::from(*d)).collect();

            Box::new(
                (0u64..)
                    .map_while(move |w| week_start.checked_add_days(Days::new(w * interval * 7)))
                    .flat_map(move |ws| {
                        days.clone()
                            .into_iter()
                            .filter_map(move |d| ws.checked_add_days(Days::new(d)))
                    })
                    .filter(move |d| *d >= date)
                    .map(move |d| d.and_time(time)),
            )
        }

        Frequency::Monthly => {
            // Same day of month; months without that day are skipped.
            let base = i64::from(date.year()) * 12 + i64::from(date.month0());
            let day = date.day();
            let step = interval as i64;

            Box::new(
                (0i64..)
                    .map(move |k| base + k * step)
                    .take_while(|idx| idx.div_euclid(12) <= i64::from(NaiveDate::MAX.year()))
                    .filter_map(move |idx| {
                        NaiveDate::from_ymd_opt(
                            idx.div_euclid(12) as i32,
                            idx.rem_euclid(12) as u32 + 1,
                            day,
                        )
                    })
                    .map(move |d| d.and_time(time)),
            )
        }
    };

    Ok(iter)
}

/// Expand `rule` into concrete instances of `template`, all tagged with `series_id`.
///
/// The series is anchored at `template.start`; every instance keeps the
/// template's duration. `max_occurrences` caps both bound kinds.
pub fn expand(
    template: &NewEvent,
    rule: &RecurrenceRule,
    series_id: i64,
    max_occurrences: u32,
) -> AppResult<Vec<NewEvent>> {
    template.validate()?;
    rule.validate()?;

    let offset = rule.tz_offset_ms / 1000;
    let first = to_local(template.start, offset)?;
    let duration = template.end - template.start;

    let (limit, until) = match rule.end {
        RecurrenceEnd::Count(n) => (n.min(max_occurrences), None),
        RecurrenceEnd::Until(u) => {
            if u < template.start {
                return Err(AppError::validation(
                    "series ends before its first occurrence",
                ));
            }
            (max_occurrences, Some(u))
        }
    };

    let instances: Vec<NewEvent> = local_starts(rule, first)?
        .map(|local| to_epoch(local, offset))
        .take_while(|start| until.is_none_or(|u| *start <= u))
        .take(limit as usize)
        .map(|start| NewEvent {
            business_id: template.business_id,
            name: template.name.clone(),
            description: template.description.clone(),
            start,
            end: start + duration,
            repeat_id: Some(series_id),
            tag: template.tag.clone(),
        })
        .collect();

    if instances.is_empty() {
        return Err(AppError::validation(
            "recurrence rule produces no occurrences",
        ));
    }
    Ok(instances)
}

fn series_id_of(edited: &Event, scope: RepeatEffect) -> AppResult<Option<i64>> {
    match (scope, edited.repeat_id) {
        (RepeatEffect::This, rid) => Ok(rid),
        (_, Some(rid)) => Ok(Some(rid)),
        (_, None) => Err(AppError::validation(format!(
            "event {} is not part of a series; use repeat effect 1",
            edited.id
        ))),
    }
}

/// Instances touched by an operation on `edited` with `scope`.
///
/// "Future" is relative to the edited instance's start, never to the clock.
pub fn affected<'a>(series: &'a [Event], edited: &Event, scope: RepeatEffect) -> Vec<&'a Event> {
    match scope {
        RepeatEffect::This => series.iter().filter(|e| e.id == edited.id).collect(),
        RepeatEffect::ThisAndFuture => series
            .iter()
            .filter(|e| e.repeat_id == edited.repeat_id && e.start >= edited.start)
            .collect(),
        RepeatEffect::All => series
            .iter()
            .filter(|e| e.repeat_id == edited.repeat_id)
            .collect(),
    }
}

/// Compute the new state of every instance an edit touches.
///
/// `new_series_id` is required for THIS_AND_FUTURE: the edited tail of the
/// series moves to it so the earlier part stays a series of its own.
pub fn plan_edit(
    series: &[Event],
    edited: &Event,
    scope: RepeatEffect,
    delta: &EventDelta,
    new_series_id: Option<i64>,
) -> AppResult<Vec<Event>> {
    series_id_of(edited, scope)?;

    match scope {
        RepeatEffect::This => {
            let mut ev = delta.apply(edited)?;
            ev.repeat_id = None;
            Ok(vec![ev])
        }
        RepeatEffect::ThisAndFuture => {
            let new_id = new_series_id.ok_or_else(|| {
                AppError::validation("splitting a series needs a new series id")
            })?;
            affected(series, edited, scope)
                .into_iter()
                .map(|e| {
                    let mut ev = delta.apply(e)?;
                    ev.repeat_id = Some(new_id);
                    Ok(ev)
                })
                .collect()
        }
        RepeatEffect::All => affected(series, edited, scope)
            .into_iter()
            .map(|e| delta.apply(e))
            .collect(),
    }
}

/// Ids removed by a scoped delete.
pub fn plan_delete(series: &[Event], edited: &Event, scope: RepeatEffect) -> AppResult<Vec<i64>> {
    series_id_of(edited, scope)?;

    if scope == RepeatEffect::This {
        return Ok(vec![edited.id]);
    }
    Ok(affected(series, edited, scope)
        .into_iter()
        .map(|e| e.id)
        .collect())
}

/// Result of re-running a (changed) pattern over an existing series.
#[derive(Debug, Default)]
pub struct ReexpansionPlan {
    /// Existing instances that survive, already carrying their new fields.
    pub keep: Vec<Event>,
    pub remove: Vec<i64>,
    pub insert: Vec<NewEvent>,
}

/// Re-expand a series with a new pattern, keeping every existing instance
/// whose start, moved by `start_shift`, coincides with a new occurrence (and
/// therefore its records).
pub fn plan_reexpansion(
    series: &[Event],
    template: &NewEvent,
    rule: &RecurrenceRule,
    start_shift: i64,
    max_occurrences: u32,
) -> AppResult<ReexpansionPlan> {
    let series_id = template
        .repeat_id
        .ok_or_else(|| AppError::validation("pattern changes apply to series only"))?;
    let occurrences = expand(template, rule, series_id, max_occurrences)?;

    let mut by_start: BTreeMap<i64, Vec<&Event>> = BTreeMap::new();
    for ev in series {
        by_start
            .entry(ev.start + start_shift)
            .or_default()
            .push(ev);
    }

    let mut plan = ReexpansionPlan::default();
    for occ in occurrences {
        let existing = by_start.get_mut(&occ.start).and_then(|v| v.pop());
        match existing {
            Some(ev) => plan.keep.push(Event {
                id: ev.id,
                business_id: ev.business_id,
                name: occ.name,
                description: occ.description,
                start: occ.start,
                end: occ.end,
                repeat_id: Some(series_id),
                tag: occ.tag,
            }),
            None => plan.insert.push(occ),
        }
    }

    plan.remove = by_start.into_values().flatten().map(|e| e.id).collect();
    Ok(plan)
}
