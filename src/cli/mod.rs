// src/cli/mod.rs
//! CLI definitions for jakarta-migrate
//!
//! This module contains the command-line interface definition using clap.
//! The command implementation is in the `commands` module.

use clap::Parser;
use jakarta_migrate::Profile;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jakarta-migrate")]
#[command(author = "jakarta-migrate contributors")]
#[command(version)]
#[command(about = "Migrate Java archives and classes from javax to jakarta", long_about = None)]
pub struct Cli {
    /// Source file or directory
    pub source: PathBuf,

    /// Destination file or directory
    pub destination: PathBuf,

    /// Namespace profile (tomcat, ee)
    #[arg(short, long, value_parser = parse_profile)]
    pub profile: Option<Profile>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Copy files and entries matching this glob unchanged (repeatable)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_profile(s: &str) -> Result<Profile, String> {
    s.parse().map_err(|e: jakarta_migrate::Error| e.to_string())
}
