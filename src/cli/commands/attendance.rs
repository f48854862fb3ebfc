//! `scan`, `scan-code`, `absent`, `alter` and `status`.

use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::attendance::{bulk_alter, mark_absent_self, record_scan, record_scan_with_code};
use crate::core::join_code::issue_scan_code;
use crate::core::notify::ConsoleNotifier;
use crate::core::stats::member_timeline;
use crate::db::repository::EventFilter;
use crate::db::ttl_store::SqliteTtlStore;
use crate::errors::{AppError, AppResult};
use crate::models::status::AttendanceStatus;
use crate::ui::messages::{error, header, info, success};
use crate::utils::colors::{colorize_optional, colorize_status};
use crate::utils::path::expand_tilde;
use crate::utils::table::Table;
use crate::utils::time::format_local;

fn ttl_store(cfg: &Config) -> AppResult<SqliteTtlStore> {
    SqliteTtlStore::open(&expand_tilde(&cfg.database).to_string_lossy())
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let offset = cfg.tz_offset_secs();
    let mut pool = super::open_pool(cfg)?;

    match cmd {
        Commands::Scan {
            event,
            user,
            code,
            at,
        } => {
            let now = super::resolve_now(at.as_ref(), cfg)?;
            let rec = match code {
                Some(c) => {
                    let store = ttl_store(cfg)?;
                    record_scan_with_code(
                        &mut pool,
                        &store,
                        c,
                        *event,
                        user,
                        now,
                        cfg.late_after_minutes,
                    )?
                }
                None => record_scan(&mut pool, *event, user, now, cfg.late_after_minutes)?,
            };
            success(format!(
                "{} checked in to event #{}: {}",
                rec.user_id,
                rec.event_id,
                colorize_status(rec.status)
            ));
        }

        Commands::ScanCode { business, at } => {
            let now = super::resolve_now(at.as_ref(), cfg)?;
            let store = ttl_store(cfg)?;
            let sc = issue_scan_code(&pool.conn, &store, *business, cfg.scan_code_ttl_secs, now)?;
            success(format!("Scan code: {}", sc.code));
            info(format!("Valid until {}", format_local(sc.expires_at, offset)));
        }

        Commands::Absent { event, user, at } => {
            let now = super::resolve_now(at.as_ref(), cfg)?;
            let rec = mark_absent_self(&mut pool, &ConsoleNotifier, *event, user, now)?;
            success(format!(
                "{} marked {} for event #{}.",
                rec.user_id,
                colorize_status(rec.status),
                rec.event_id
            ));
        }

        Commands::Alter {
            events,
            users,
            status,
        } => {
            let status = AttendanceStatus::from_input(status).ok_or_else(|| {
                AppError::validation(format!(
                    "invalid status '{status}' (expected present, absent, late, excused or self)"
                ))
            })?;
            let report = bulk_alter(&mut pool, events, users, status, crate::utils::time::now())?;

            for f in &report.failed {
                error(format!("event #{} / {}: {}", f.event_id, f.user_id, f.reason));
            }
            success(format!(
                "{} record(s) set to {}, {} failed.",
                report.succeeded.len(),
                colorize_status(status),
                report.failed.len()
            ));
        }

        Commands::Status {
            business,
            user,
            from,
            to,
            at,
        } => {
            let now = super::resolve_now(at.as_ref(), cfg)?;
            let (from, until) = super::parse_bounds(from.as_ref(), to.as_ref(), cfg)?;
            let filter = EventFilter {
                from,
                until,
                tag: None,
            };

            let timeline = member_timeline(&pool.conn, *business, user, &filter, now)?;
            if timeline.is_empty() {
                info(format!("No events for business #{business}."));
                return Ok(());
            }

            header(format!("Attendance of {user} in business #{business}"));
            let mut table = Table::new(&["Event", "Start", "Name", "Status", "Recorded"]);
            for entry in &timeline {
                table.add_row(vec![
                    entry.event.id.to_string(),
                    format_local(entry.event.start, offset),
                    entry.event.name.clone(),
                    colorize_status(entry.status),
                    colorize_optional(
                        &entry
                            .recorded_at
                            .map(|t| format_local(t, offset))
                            .unwrap_or_default(),
                    ),
                ]);
            }
            print!("{}", table.render());
        }

        _ => {}
    }
    Ok(())
}
