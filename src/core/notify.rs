//! Outbound notifications. Delivery (mail, push, chat) belongs to the host;
//! the core only reports what happened.

use crate::models::event::Event;
use crate::models::record::Record;
use crate::ui::messages::info;

pub trait Notifier {
    /// A member reported their own absence for `event`.
    fn absence_reported(&self, event: &Event, record: &Record);
}

/// Prints notifications to the terminal. Used by the CLI host.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn absence_reported(&self, event: &Event, record: &Record) {
        info(format!(
            "Notify business {}: {} will miss '{}' (event {})",
            event.business_id, record.user_id, event.name, event.id
        ));
    }
}

/// Drops every notification.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn absence_reported(&self, _event: &Event, _record: &Record) {}
}
