use super::recurrence::RecurrenceRule;
use crate::errors::{AppError, AppResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: i64,                // ⇔ events.id
    pub business_id: i64,       // ⇔ events.business_id
    pub name: String,           // ⇔ events.name
    pub description: String,    // ⇔ events.description
    pub start: i64,             // ⇔ events.start_ts (epoch seconds)
    pub end: i64,               // ⇔ events.end_ts (epoch seconds)
    pub repeat_id: Option<i64>, // ⇔ events.repeat_id (NULL for one-off events)
    pub tag: String,            // ⇔ events.tag
}

impl Event {
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// An event is concluded once `now` reaches its end.
    pub fn is_concluded(&self, now: i64) -> bool {
        now >= self.end
    }
}

/// An event that has not been stored yet. Also used as the template of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub business_id: i64,
    pub name: String,
    pub description: String,
    pub start: i64,
    pub end: i64,
    pub repeat_id: Option<i64>,
    pub tag: String,
}

impl NewEvent {
    pub fn new(business_id: i64, name: &str, start: i64, end: i64) -> Self {
        Self {
            business_id,
            name: name.to_string(),
            description: String::new(),
            start,
            end,
            repeat_id: None,
            tag: String::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("event name must not be empty"));
        }
        check_range(self.start, self.end)
    }

    pub fn from_event(ev: &Event) -> Self {
        Self {
            business_id: ev.business_id,
            name: ev.name.clone(),
            description: ev.description.clone(),
            start: ev.start,
            end: ev.end,
            repeat_id: ev.repeat_id,
            tag: ev.tag.clone(),
        }
    }
}

pub fn check_range(start: i64, end: i64) -> AppResult<()> {
    if start > end {
        return Err(AppError::validation(format!(
            "event start ({start}) is after its end ({end})"
        )));
    }
    Ok(())
}

/// Caller-facing update: absolute new values for the edited instance.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    /// New recurrence pattern; only accepted together with scope ALL.
    pub pattern: Option<RecurrenceRule>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.tag.is_none()
            && self.pattern.is_none()
    }
}

/// The same change expressed relative to the edited instance, so it can be
/// replayed on the other instances of a series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDelta {
    pub start_shift: i64,
    pub end_shift: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
}

impl EventDelta {
    pub fn from_update(edited: &Event, update: &EventUpdate) -> Self {
        Self {
            start_shift: update.start.map_or(0, |s| s - edited.start),
            end_shift: update.end.map_or(0, |e| e - edited.end),
            name: update.name.clone(),
            description: update.description.clone(),
            tag: update.tag.clone(),
        }
    }

    /// Apply to one instance; fails if the result would end before it starts.
    pub fn apply(&self, ev: &Event) -> AppResult<Event> {
        let mut out = ev.clone();
        out.start += self.start_shift;
        out.end += self.end_shift;
        if let Some(n) = &self.name {
            if n.trim().is_empty() {
                return Err(AppError::validation("event name must not be empty"));
            }
            out.name = n.clone();
        }
        if let Some(d) = &self.description {
            out.description = d.clone();
        }
        if let Some(t) = &self.tag {
            out.tag = t.clone();
        }
        check_range(out.start, out.end)?;
        Ok(out)
    }
}
