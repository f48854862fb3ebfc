use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::{LogEntry, load_log};
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::table::visible_width;
use ansi_term::Colour;

const OP_WIDTH: usize = 60;

/// Color of an audit operation
fn color_for_operation(op: &str) -> Colour {
    match op {
        "business_add" | "member_add" | "event_add" | "join" | "join_approve" => Colour::Green,
        "event_del" => Colour::Red,
        "event_edit" | "alter" | "import" => Colour::Yellow,
        "scan" | "scan_code_issue" => Colour::Cyan,
        "absent_self" | "join_request" => Colour::Blue,
        "join_code_issue" | "join_code_rotate" => Colour::RGB(255, 153, 51),
        "migration_applied" => Colour::Purple,
        _ => Colour::White,
    }
}

fn render_entry(entry: &LogEntry, id_w: usize, date_w: usize) -> String {
    let date = chrono::DateTime::parse_from_rfc3339(&entry.date)
        .map(|dt| dt.format("%FT%T%:z").to_string())
        .unwrap_or_else(|_| entry.date.clone());

    let mut visible = if entry.target.is_empty() {
        entry.operation.clone()
    } else {
        format!("{} ({})", entry.operation, entry.target)
    };
    if visible.chars().count() > OP_WIDTH {
        visible = visible.chars().take(OP_WIDTH - 3).collect::<String>() + "...";
    }

    // only the operation word is colored
    let color = color_for_operation(&entry.operation);
    let colored = match visible.split_once(' ') {
        Some((op, rest)) => format!("{} {}", color.paint(op), rest),
        None => color.paint(visible.as_str()).to_string(),
    };
    let padding = " ".repeat(OP_WIDTH.saturating_sub(visible_width(&colored)));

    format!(
        "{:>id_w$}: {:<date_w$} | {}{} => {}",
        entry.id,
        date,
        colored,
        padding,
        entry.message,
        id_w = id_w,
        date_w = date_w
    )
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Log { print, operation } = cmd {
        if !*print {
            info("Use --print to show the internal log.");
            return Ok(());
        }

        let pool = super::open_pool(cfg)?;
        let entries = load_log(&pool.conn, operation.as_deref())?;
        if entries.is_empty() {
            info("The internal log is empty.");
            return Ok(());
        }

        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");
        for entry in &entries {
            println!("{}", render_entry(entry, id_w, date_w));
        }
    }
    Ok(())
}
