// src/error.rs

//! Error types for migration runs

use crate::convert::ConvertError;
use crate::manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while migrating artifacts
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot read source: {0}")]
    SourceNotReadable(PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory { path: PathBuf, source: io::Error },

    #[error("Invalid archive: {0}")]
    Archive(zip::result::ZipError),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Failed to convert {name}: {source}")]
    Convert { name: String, source: ConvertError },

    #[error("Unknown profile: {0} (expected 'tomcat' or 'ee')")]
    InvalidProfile(String),

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExclude {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to load config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl Error {
    /// Whether the failure is confined to a single archive entry
    ///
    /// Recoverable errors mark the entry as failed and let the enclosing
    /// archive carry on with its remaining entries. Everything else is an
    /// I/O fault that aborts the artifact being migrated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Archive(_) | Self::Manifest(_) | Self::Convert { .. }
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::Archive(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
