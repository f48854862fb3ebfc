//! Event operations: single and recurring creation, scoped edit and delete.
//!
//! Every operation loads what it needs, asks `core::recurrence` for a plan
//! and writes the plan back inside one transaction, so a failing instance
//! leaves the store untouched.

use crate::core::business::{require_business, require_event};
use crate::core::recurrence::{expand, plan_delete, plan_edit, plan_reexpansion};
use crate::db::pool::DbPool;
use crate::db::repository::{EventFilter, Repository};
use crate::errors::{AppError, AppResult};
use crate::models::event::{Event, EventDelta, EventUpdate, NewEvent};
use crate::models::recurrence::{RecurrenceRule, RepeatEffect};

/// Store a one-off event.
pub fn create_event(pool: &mut DbPool, ev: &NewEvent) -> AppResult<Event> {
    ev.validate()?;

    pool.transaction(|repo| {
        require_business(repo, ev.business_id)?;
        let mut single = ev.clone();
        single.repeat_id = None;
        let stored = repo.insert_event(&single)?;
        repo.audit(
            "event_add",
            &stored.id.to_string(),
            &format!("Created event '{}'", stored.name),
        )?;
        Ok(stored)
    })
}

/// Expand `rule` from `template` and store every instance under a fresh series id.
pub fn create_recurring_event(
    pool: &mut DbPool,
    template: &NewEvent,
    rule: &RecurrenceRule,
    max_occurrences: u32,
) -> AppResult<Vec<Event>> {
    pool.transaction(|repo| {
        require_business(repo, template.business_id)?;
        let series_id = repo.next_series_id()?;
        let instances = expand(template, rule, series_id, max_occurrences)?;

        let mut stored = Vec::with_capacity(instances.len());
        for inst in &instances {
            stored.push(repo.insert_event(inst)?);
        }

        repo.audit(
            "event_add",
            &format!("series {series_id}"),
            &format!(
                "Created {} {} instance(s) of '{}'",
                stored.len(),
                rule.frequency.as_str(),
                template.name
            ),
        )?;
        Ok(stored)
    })
}

pub fn get_event<R: Repository + ?Sized>(repo: &R, id: i64) -> AppResult<Event> {
    require_event(repo, id)
}

pub fn list_events<R: Repository + ?Sized>(
    repo: &R,
    business_id: i64,
    filter: &EventFilter,
) -> AppResult<Vec<Event>> {
    require_business(repo, business_id)?;
    repo.events_by_business(business_id, filter)
}

fn load_series<R: Repository + ?Sized>(repo: &R, edited: &Event) -> AppResult<Vec<Event>> {
    match edited.repeat_id {
        Some(rid) => repo.events_by_series(rid),
        None => Ok(vec![edited.clone()]),
    }
}

/// Apply `update` to event `id` and, depending on `scope`, to the rest of its series.
///
/// Returns the events as stored after the update.
pub fn update_event(
    pool: &mut DbPool,
    id: i64,
    update: &EventUpdate,
    scope: RepeatEffect,
    max_occurrences: u32,
) -> AppResult<Vec<Event>> {
    if update.is_empty() {
        return Err(AppError::validation("nothing to update"));
    }

    pool.transaction(|repo| {
        let edited = require_event(repo, id)?;
        let delta = EventDelta::from_update(&edited, update);

        if let Some(rule) = &update.pattern {
            return reexpand_series(repo, &edited, &delta, rule, scope, max_occurrences);
        }

        let series = load_series(repo, &edited)?;
        let new_series_id = match scope {
            RepeatEffect::ThisAndFuture => Some(repo.next_series_id()?),
            _ => None,
        };

        let updated = plan_edit(&series, &edited, scope, &delta, new_series_id)?;
        for ev in &updated {
            repo.update_event(ev)?;
        }

        repo.audit(
            "event_edit",
            &id.to_string(),
            &format!("Updated {} instance(s) with scope {}", updated.len(), scope),
        )?;
        Ok(updated)
    })
}

/// Pattern change: the whole series is re-expanded from its (shifted) first
/// instance. Instances whose shifted start is still an occurrence keep their
/// id and records.
fn reexpand_series<R: Repository + ?Sized>(
    repo: &R,
    edited: &Event,
    delta: &EventDelta,
    rule: &RecurrenceRule,
    scope: RepeatEffect,
    max_occurrences: u32,
) -> AppResult<Vec<Event>> {
    if scope != RepeatEffect::All {
        return Err(AppError::validation(
            "a new recurrence pattern can only be applied to the whole series (repeat effect 3)",
        ));
    }
    let series_id = edited.repeat_id.ok_or_else(|| {
        AppError::validation(format!("event {} is not part of a series", edited.id))
    })?;

    let series = repo.events_by_series(series_id)?;
    let first = series
        .first()
        .ok_or_else(|| AppError::not_found("series", series_id))?;
    let template = NewEvent::from_event(&delta.apply(first)?);

    let plan = plan_reexpansion(&series, &template, rule, delta.start_shift, max_occurrences)?;

    repo.delete_events(&plan.remove)?;
    for ev in &plan.keep {
        repo.update_event(ev)?;
    }
    for ev in &plan.insert {
        repo.insert_event(ev)?;
    }

    repo.audit(
        "event_edit",
        &format!("series {series_id}"),
        &format!(
            "Pattern changed: kept {}, removed {}, added {}",
            plan.keep.len(),
            plan.remove.len(),
            plan.insert.len()
        ),
    )?;
    repo.events_by_series(series_id)
}

/// Delete event `id` (and, depending on `scope`, more of its series).
/// Records of deleted events go with them. Returns the deleted ids.
pub fn delete_event(pool: &mut DbPool, id: i64, scope: RepeatEffect) -> AppResult<Vec<i64>> {
    pool.transaction(|repo| {
        let target = require_event(repo, id)?;
        let series = load_series(repo, &target)?;
        let ids = plan_delete(&series, &target, scope)?;

        let removed = repo.delete_events(&ids)?;
        repo.audit(
            "event_del",
            &id.to_string(),
            &format!("Deleted {removed} instance(s) with scope {scope}"),
        )?;
        Ok(ids)
    })
}
