use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::stats::{StatsFilter, get_member_stats};
use crate::db::repository::EventFilter;
use crate::errors::{AppError, AppResult};
use crate::models::member::Role;
use crate::ui::messages::{header, info};
use crate::utils::colors::{RESET, color_for_rate};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Stats {
        business,
        from,
        to,
        tag,
        role,
        upcoming,
        json,
        at,
    } = cmd
    {
        let now = super::resolve_now(at.as_ref(), cfg)?;
        let (from, until) = super::parse_bounds(from.as_ref(), to.as_ref(), cfg)?;
        let role = role
            .as_ref()
            .map(|r| {
                Role::from_code(r)
                    .ok_or_else(|| AppError::validation(format!("invalid role '{r}'")))
            })
            .transpose()?;

        let filter = StatsFilter {
            events: EventFilter {
                from,
                until,
                tag: tag.clone(),
            },
            include_upcoming: *upcoming,
            role,
        };

        let pool = super::open_pool(cfg)?;
        let rows = get_member_stats(&pool.conn, *business, &filter, now)?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        if rows.is_empty() {
            info(format!("Business #{business} has no members."));
            return Ok(());
        }

        header(format!("Attendance summary for business #{business}"));
        let mut table = Table::new(&[
            "User", "Name", "Role", "Total", "Present", "Late", "Excused", "Absent", "Rate",
        ]);
        for r in &rows {
            let rate = r.counts.attendance_rate();
            table.add_row(vec![
                r.user_id.clone(),
                r.name.clone(),
                r.role.to_db_str().to_string(),
                r.counts.total.to_string(),
                r.counts.present.to_string(),
                r.counts.late.to_string(),
                r.counts.excused.to_string(),
                r.counts.absent.to_string(),
                format!("{}{:.1}%{}", color_for_rate(rate), rate, RESET),
            ]);
        }
        print!("{}", table.render());
    }
    Ok(())
}
