pub mod initialize;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod queries;
pub mod repository;
pub mod ttl_store;

pub use migrate::run_pending_migrations;
pub use pool::DbPool;
pub use repository::{EventFilter, Repository};
