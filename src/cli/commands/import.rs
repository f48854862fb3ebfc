use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::import::{JoinColumn, import_custom_data};
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success, warning};
use crate::utils::path::read_input;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Import {
        business,
        file,
        join_column,
        overwrite,
    } = cmd
    {
        let join_column = JoinColumn::from_code(join_column)?;
        let csv_text = read_input(file)?;

        let mut pool = super::open_pool(cfg)?;
        let report = import_custom_data(&mut pool, *business, &csv_text, join_column, *overwrite)?;

        for u in &report.updated {
            info(format!(
                "line {}: {} ← {}",
                u.line,
                u.user_id,
                u.fields.join(", ")
            ));
        }
        for s in &report.skipped {
            warning(format!(
                "line {}: {} already has '{}', kept",
                s.line, s.user_id, s.field
            ));
        }
        for e in &report.errors {
            error(format!("line {}: {} ({})", e.line, e.kind, e.detail));
        }

        success(format!(
            "Import finished: {} row(s) updated, {} field(s) skipped, {} error(s).",
            report.updated.len(),
            report.skipped.len(),
            report.errors.len()
        ));
    }
    Ok(())
}
