use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::migrate::run_pending_migrations;
use crate::db::log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Handle the `init` command
///
/// Creates the configuration directory and file (skipped with `--test`),
/// the SQLite database, and applies every pending migration.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.as_deref(), cli.test)?;
    let db_str = db_path.to_string_lossy().to_string();

    info("Initializing rAttendance…");
    if !cli.test {
        info(format!("Config file : {}", Config::config_file().display()));
    }
    info(format!("Database    : {}", db_str));

    let pool = DbPool::new(&db_str)?;
    for version in run_pending_migrations(&pool.conn)? {
        info(format!("Migration applied: {version}"));
    }

    // non-blocking
    if let Err(e) = log::ttlog(
        &pool.conn,
        "init",
        &db_str,
        &format!("Database initialized at {}", db_str),
    ) {
        warning(format!("Failed to write internal log: {}", e));
    }

    success(format!("Database initialized at {}", db_str));
    Ok(())
}
