// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;
use commands::MigrateOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the command line
    let default_level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let options = MigrateOptions {
        config: cli.config,
        profile: cli.profile,
        excludes: cli.excludes,
    };

    if !commands::cmd_migrate(&cli.source, &cli.destination, &options)? {
        std::process::exit(1);
    }
    Ok(())
}
