//! Path utilities: expand ~ in user-supplied paths and read input files.

use crate::errors::{AppError, AppResult};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path.trim_start_matches("~/"));
    }
    PathBuf::from(path)
}

/// Read a whole text file; `-` reads standard input.
pub fn read_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }

    let resolved = expand_tilde(path);
    if !resolved.exists() {
        return Err(AppError::not_found("file", resolved.display()));
    }
    Ok(fs::read_to_string(resolved)?)
}
