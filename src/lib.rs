// src/lib.rs

//! Jakarta EE namespace migration
//!
//! Rewrites compiled classes, descriptors and nested archives from the
//! legacy `javax` namespace to `jakarta`, keeping everything else
//! byte-for-byte intact.
//!
//! # Architecture
//!
//! - Tree orchestration: mirror a source tree, fold per-file outcomes
//! - Archive codec: rewrite zip containers entry by entry, recursing into nested archives
//! - Manifest processing: version stamping and signature stripping
//! - Content transformers: text, class file and pass-through, first acceptor wins
//!
//! ```no_run
//! use jakarta_migrate::{Migration, MigrationConfig, Profile};
//! use std::path::Path;
//!
//! let config = MigrationConfig::default().with_profile(Profile::Ee);
//! let migration = Migration::new(config)?;
//! let report = migration.execute(Path::new("webapps"), Path::new("webapps-jakarta"))?;
//! assert!(report.success);
//! # Ok::<(), jakarta_migrate::Error>(())
//! ```

pub mod archive;
pub mod config;
pub mod convert;
mod error;
pub mod manifest;
pub mod migration;
pub mod namespace;
pub mod stream;

pub use archive::{ArchiveFormat, ArchiveOutcome};
pub use config::MigrationConfig;
pub use convert::{ConvertError, Converter, ConverterChain};
pub use error::{Error, Result};
pub use manifest::{Manifest, ManifestError};
pub use migration::{Migration, MigrationReport, MigrationStats};
pub use namespace::{NamespaceTable, Profile};
