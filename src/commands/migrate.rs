// src/commands/migrate.rs

//! The migrate command

use anyhow::{Context, Result};
use jakarta_migrate::{Migration, MigrationConfig, Profile};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line overrides applied on top of the config file
#[derive(Debug, Default)]
pub struct MigrateOptions {
    pub config: Option<PathBuf>,
    pub profile: Option<Profile>,
    pub excludes: Vec<String>,
}

impl MigrateOptions {
    fn load_config(&self) -> Result<MigrationConfig> {
        let mut config = match &self.config {
            Some(path) => MigrationConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => MigrationConfig::default(),
        };
        if let Some(profile) = self.profile {
            config = config.with_profile(profile);
        }
        for pattern in &self.excludes {
            config = config.with_exclude(pattern);
        }
        Ok(config)
    }
}

/// Migrate `source` into `destination`, returning overall success
pub fn cmd_migrate(source: &Path, destination: &Path, options: &MigrateOptions) -> Result<bool> {
    let config = options.load_config()?;
    info!(
        "Profile: {}, tool version: {}, {} exclude pattern(s)",
        config.profile,
        config.tool_version,
        config.excludes.len()
    );

    let migration = Migration::new(config).context("Invalid migration settings")?;
    let report = migration
        .execute(source, destination)
        .with_context(|| format!("Failed to migrate {}", source.display()))?;

    let stats = report.stats;
    println!(
        "Migration {} in {}ms",
        if report.success { "succeeded" } else { "failed" },
        report.elapsed.as_millis()
    );
    println!(
        "  {} file(s), {} archive(s), {} entries, {} failure(s)",
        stats.files, stats.archives, stats.entries, stats.failures
    );
    if stats.signatures_removed > 0 {
        println!(
            "  Signatures removed from {} archive(s); re-sign them if required",
            stats.signatures_removed
        );
    }

    Ok(report.success)
}
