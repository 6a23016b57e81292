// src/config.rs

//! Migration configuration
//!
//! The configuration is fixed before a run starts and shared read-only by the
//! manifest processor and the content transformers. It can be built in code
//! or loaded from a TOML file:
//!
//! ```toml
//! profile = "ee"
//! tool_version = "1.0.0"
//! excludes = ["*-sources.jar", "legacy-*.war"]
//! ```

use crate::error::{Error, Result};
use crate::namespace::Profile;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Namespace table selector
    pub profile: Profile,

    /// Appended to Implementation-Version headers
    pub tool_version: String,

    /// Glob patterns for file/entry names copied without migration
    pub excludes: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            excludes: Vec::new(),
        }
    }
}

impl MigrationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.compile_excludes()?;
        Ok(config)
    }

    /// Set the namespace profile
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the tool version used for stamping
    pub fn with_tool_version(mut self, version: &str) -> Self {
        self.tool_version = version.to_string();
        self
    }

    /// Add an exclude pattern
    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.excludes.push(pattern.to_string());
        self
    }

    /// Compile exclude patterns, rejecting malformed ones
    pub fn compile_excludes(&self) -> Result<Vec<Pattern>> {
        self.excludes
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| Error::InvalidExclude {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.profile, Profile::Tomcat);
        assert_eq!(config.tool_version, env!("CARGO_PKG_VERSION"));
        assert!(config.excludes.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = MigrationConfig::new()
            .with_profile(Profile::Ee)
            .with_tool_version("9.9")
            .with_exclude("*.war");
        assert_eq!(config.profile, Profile::Ee);
        assert_eq!(config.tool_version, "9.9");
        assert_eq!(config.compile_excludes().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_exclude_rejected() {
        let config = MigrationConfig::new().with_exclude("[unclosed");
        assert!(matches!(
            config.compile_excludes(),
            Err(Error::InvalidExclude { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("migrate.toml");
        std::fs::write(&path, "profile = \"ee\"\nexcludes = [\"*-sources.jar\"]\n").unwrap();

        let config = MigrationConfig::from_file(&path).unwrap();
        assert_eq!(config.profile, Profile::Ee);
        assert_eq!(config.excludes, vec!["*-sources.jar".to_string()]);
        // Unset keys keep their defaults
        assert_eq!(config.tool_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_from_file_rejects_unknown_profile() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("migrate.toml");
        std::fs::write(&path, "profile = \"javaee\"\n").unwrap();

        assert!(matches!(
            MigrationConfig::from_file(&path),
            Err(Error::Config { .. })
        ));
    }
}
