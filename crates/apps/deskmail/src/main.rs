//! Deskmail - browse, search and read desktop mail from the terminal
//!
//! This is the main entry point for the Deskmail CLI.

use clap::Parser;
use log::{debug, warn};
use mail::AppConfig;
use std::io::Write;

mod cli;
mod commands;
mod render;

use cli::Cli;
use commands::App;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Expected failures are reported, not raised: the exit status stays 0
    if let Err(e) = run(cli, &mut out) {
        debug!("Command failed: {:?}", e);
        let _ = writeln!(out, "Error: {:#}", e);
    }
    let _ = out.flush();
}

fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let app = App::from_config(config, cli.backend.as_deref())?;
    app.run(cli.command, out)
}
