//! rAttendance library root.
//! Exposes the CLI parser, the high-level run() function, and the core
//! attendance operations for other hosts.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    use crate::cli::commands as c;

    match &cli.command {
        Commands::Init => c::init::handle(cli),
        Commands::Config { .. } => c::config::handle(&cli.command, cfg),
        Commands::Log { .. } => c::log::handle(&cli.command, cfg),
        Commands::Business { .. }
        | Commands::User { .. }
        | Commands::Member { .. }
        | Commands::JoinCode { .. }
        | Commands::Join { .. }
        | Commands::Approve { .. } => c::business::handle(&cli.command, cfg),
        Commands::Event { .. }
        | Commands::Edit { .. }
        | Commands::Del { .. }
        | Commands::List { .. } => c::event::handle(&cli.command, cfg),
        Commands::Scan { .. }
        | Commands::ScanCode { .. }
        | Commands::Absent { .. }
        | Commands::Alter { .. }
        | Commands::Status { .. } => c::attendance::handle(&cli.command, cfg),
        Commands::Import { .. } => c::import::handle(&cli.command, cfg),
        Commands::Stats { .. } => c::stats::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // load config once; --db wins over the configured database
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg)
}
