pub mod attendance;
pub mod business;
pub mod events;
pub mod import;
pub mod join_code;
pub mod notify;
pub mod recurrence;
pub mod stats;
