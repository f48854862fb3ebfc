pub mod attendance;
pub mod business;
pub mod config;
pub mod event;
pub mod import;
pub mod init;
pub mod log;
pub mod stats;

use crate::cli::parser::RepeatArgs;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::recurrence::{Frequency, RecurrenceEnd, RecurrenceRule, parse_days_of_week};
use crate::utils::path::expand_tilde;
use crate::utils::time;
use std::collections::BTreeSet;

/// Open the configured database, bringing its schema up to date.
pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    let path = expand_tilde(&cfg.database);
    let pool = DbPool::new(&path.to_string_lossy())?;
    init_db(&pool.conn)?;
    Ok(pool)
}

/// `--at` override or the current instant.
pub(crate) fn resolve_now(at: Option<&String>, cfg: &Config) -> AppResult<i64> {
    Ok(time::parse_optional_local(at, cfg.tz_offset_secs())?.unwrap_or_else(time::now))
}

/// Build a recurrence rule from the command line, or `None` without `--repeat`.
pub(crate) fn build_rule(args: &RepeatArgs, cfg: &Config) -> AppResult<Option<RecurrenceRule>> {
    let Some(freq) = &args.frequency else {
        if args.days.is_some() || args.until.is_some() || args.count.is_some() {
            return Err(AppError::validation(
                "--days, --until and --count require --repeat",
            ));
        }
        return Ok(None);
    };

    let frequency = Frequency::from_code(freq).ok_or_else(|| {
        AppError::validation(format!(
            "invalid frequency '{freq}' (expected daily, weekly or monthly)"
        ))
    })?;

    let days_of_week = match &args.days {
        Some(d) => parse_days_of_week(d)?,
        None => BTreeSet::new(),
    };

    let until = args
        .until
        .as_ref()
        .map(|u| time::parse_local_end_of_day(u, cfg.tz_offset_secs()))
        .transpose()?;

    let rule = RecurrenceRule {
        frequency,
        interval: args.interval,
        days_of_week,
        tz_offset_ms: cfg.tz_offset_secs() * 1000,
        end: RecurrenceEnd::from_parts(until, args.count)?,
    };
    rule.validate()?;
    Ok(Some(rule))
}

/// `--from`/`--to` bounds in local time. A bare `--to` date covers that whole day.
pub(crate) fn parse_bounds(
    from: Option<&String>,
    to: Option<&String>,
    cfg: &Config,
) -> AppResult<(Option<i64>, Option<i64>)> {
    let offset = cfg.tz_offset_secs();
    let from = time::parse_optional_local(from, offset)?;
    let to = to
        .map(|t| time::parse_local_end_of_day(t, offset))
        .transpose()?;
    Ok((from, to))
}
