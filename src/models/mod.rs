pub mod business;
pub mod event;
pub mod member;
pub mod record;
pub mod recurrence;
pub mod status;
