//! `event`, `edit`, `del` and `list`.

use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::events::{
    create_event, create_recurring_event, delete_event, get_event, list_events, update_event,
};
use crate::db::repository::EventFilter;
use crate::errors::AppResult;
use crate::models::event::{Event, EventUpdate, NewEvent};
use crate::models::recurrence::RepeatEffect;
use crate::ui::messages::{header, info, success, warning};
use crate::utils::colors::colorize_optional;
use crate::utils::table::Table;
use crate::utils::time::{format_local, format_minutes, parse_local, parse_optional_local};
use std::io::{self, Write};

/// Ask a yes/no confirmation from the user
fn ask_confirmation(prompt: &str) -> AppResult<bool> {
    warning(prompt);
    print!("Confirm [y/N]: ");
    io::stdout().flush()?;

    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(matches!(s.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_events(events: &[Event], offset: i64) {
    let mut table = Table::new(&["ID", "Start", "End", "Dur", "Name", "Tag", "Series"]);
    for ev in events {
        table.add_row(vec![
            ev.id.to_string(),
            format_local(ev.start, offset),
            format_local(ev.end, offset),
            format_minutes(ev.duration() / 60),
            ev.name.clone(),
            colorize_optional(&ev.tag),
            colorize_optional(&ev.repeat_id.map(|r| r.to_string()).unwrap_or_default()),
        ]);
    }
    print!("{}", table.render());
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let offset = cfg.tz_offset_secs();

    match cmd {
        Commands::Event {
            business,
            name,
            start,
            end,
            description,
            tag,
            repeat,
        } => {
            let mut ev = NewEvent::new(
                *business,
                name,
                parse_local(start, offset)?,
                parse_local(end, offset)?,
            );
            if let Some(d) = description {
                ev = ev.with_description(d);
            }
            if let Some(t) = tag {
                ev = ev.with_tag(t);
            }

            let mut pool = super::open_pool(cfg)?;
            match super::build_rule(repeat, cfg)? {
                Some(rule) => {
                    let created =
                        create_recurring_event(&mut pool, &ev, &rule, cfg.max_occurrences)?;
                    success(format!(
                        "Created {} occurrence(s) of '{}' (series #{}).",
                        created.len(),
                        ev.name,
                        created
                            .first()
                            .and_then(|e| e.repeat_id)
                            .unwrap_or_default()
                    ));
                    print_events(&created, offset);
                }
                None => {
                    let stored = create_event(&mut pool, &ev)?;
                    success(format!("Event #{} '{}' created.", stored.id, stored.name));
                }
            }
        }

        Commands::Edit {
            id,
            start,
            end,
            name,
            description,
            tag,
            effect,
            repeat,
        } => {
            let scope = RepeatEffect::from_code(*effect)?;
            let update = EventUpdate {
                start: parse_optional_local(start.as_ref(), offset)?,
                end: parse_optional_local(end.as_ref(), offset)?,
                name: name.clone(),
                description: description.clone(),
                tag: tag.clone(),
                pattern: super::build_rule(repeat, cfg)?,
            };

            let mut pool = super::open_pool(cfg)?;
            let updated = update_event(&mut pool, *id, &update, scope, cfg.max_occurrences)?;
            success(format!("{} event(s) updated ({}).", updated.len(), scope));
            print_events(&updated, offset);
        }

        Commands::Del { id, effect, yes } => {
            let scope = RepeatEffect::from_code(*effect)?;
            let mut pool = super::open_pool(cfg)?;
            let target = get_event(&pool.conn, *id)?;

            let prompt = match scope {
                RepeatEffect::This => format!(
                    "Delete event #{} '{}' and its attendance records?",
                    target.id, target.name
                ),
                _ => format!(
                    "Delete event #{} '{}' and other events of its series ({})? Attendance records go too.",
                    target.id, target.name, scope
                ),
            };
            if !*yes && !ask_confirmation(&prompt)? {
                info("Operation cancelled.");
                return Ok(());
            }

            let ids = delete_event(&mut pool, *id, scope)?;
            success(format!("{} event(s) deleted.", ids.len()));
        }

        Commands::List {
            business,
            from,
            to,
            tag,
        } => {
            let (from, until) = super::parse_bounds(from.as_ref(), to.as_ref(), cfg)?;
            let filter = EventFilter {
                from,
                until,
                tag: tag.clone(),
            };

            let pool = super::open_pool(cfg)?;
            let events = list_events(&pool.conn, *business, &filter)?;
            if events.is_empty() {
                info(format!("No events for business #{business}."));
                return Ok(());
            }
            header(format!("Events of business #{business}"));
            print_events(&events, offset);
        }

        _ => {}
    }
    Ok(())
}
