// src/migration.rs

//! Tree orchestration and per-artifact migration
//!
//! [`Migration::execute`] mirrors a source file or directory tree into a
//! destination, migrating every file on the way. Failures are folded into a
//! single success flag: a broken file or entry is logged and marks the run as
//! failed, but the rest of the tree is still attempted. Only a destination
//! root that cannot be created aborts the run.
//!
//! Content dispatch for a named stream, in order:
//! 1. excluded names are copied unchanged
//! 2. archives (`.jar`, `.war`, `.zip`) are migrated entry by entry
//! 3. the first content transformer that accepts the name

use crate::archive::{self, ArchiveOutcome};
use crate::config::MigrationConfig;
use crate::convert::{ConvertError, ConverterChain};
use crate::error::{Error, Result};
use crate::namespace::NamespaceTable;
use glob::Pattern;
use std::cell::Cell;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counters collected during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStats {
    /// Files migrated from the source tree
    pub files: usize,
    /// Archives migrated, nested ones included
    pub archives: usize,
    /// Archive entries written
    pub entries: usize,
    /// Archives whose signature material was stripped
    pub signatures_removed: usize,
    /// Files, directories and entries that failed
    pub failures: usize,
}

/// Outcome of [`Migration::execute`]
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Every artifact in the tree migrated successfully
    pub success: bool,
    pub elapsed: Duration,
    pub stats: MigrationStats,
}

/// A configured migration run
///
/// Runs are single-threaded and depth-first.
#[derive(Debug)]
pub struct Migration {
    config: MigrationConfig,
    table: NamespaceTable,
    chain: ConverterChain,
    excludes: Vec<Pattern>,
    stats: Cell<MigrationStats>,
}

impl Migration {
    /// Validate the configuration and prepare the transformers
    pub fn new(config: MigrationConfig) -> Result<Self> {
        let excludes = config.compile_excludes()?;
        let table = config.profile.table();
        Ok(Self {
            chain: ConverterChain::new(table),
            table,
            excludes,
            config,
            stats: Cell::new(MigrationStats::default()),
        })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn table(&self) -> NamespaceTable {
        self.table
    }

    /// Counters since the last call to [`execute`](Self::execute)
    pub fn stats(&self) -> MigrationStats {
        self.stats.get()
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut MigrationStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    /// Check a file or entry name against the exclude patterns
    ///
    /// Only the last path component is matched.
    pub fn is_excluded(&self, name: &str) -> bool {
        let file_name = name.trim_end_matches('/').rsplit('/').next().unwrap_or(name);
        self.excludes.iter().any(|p| p.matches(file_name))
    }

    /// Migrate `src` (a file or directory) into `dest`
    pub fn execute(&self, src: &Path, dest: &Path) -> Result<MigrationReport> {
        let start = Instant::now();
        self.stats.set(MigrationStats::default());

        let metadata =
            fs::metadata(src).map_err(|_| Error::SourceNotReadable(src.to_path_buf()))?;

        info!(
            "Migrating {} to {} (profile: {})",
            src.display(),
            dest.display(),
            self.config.profile
        );

        let success = if metadata.is_dir() {
            self.migrate_tree(src, dest)?
        } else {
            self.migrate_single(src, dest)
        };

        let elapsed = start.elapsed();
        let stats = self.stats();
        info!(
            "Migration {} in {}ms: {} files, {} archives, {} entries, {} failures",
            if success { "succeeded" } else { "failed" },
            elapsed.as_millis(),
            stats.files,
            stats.archives,
            stats.entries,
            stats.failures
        );

        Ok(MigrationReport {
            success,
            elapsed,
            stats,
        })
    }

    fn migrate_tree(&self, src: &Path, dest: &Path) -> Result<bool> {
        fs::create_dir_all(dest).map_err(|source| Error::CreateDirectory {
            path: dest.to_path_buf(),
            source,
        })?;

        let mut success = true;
        let mut walker = WalkDir::new(src).min_depth(1).follow_links(true).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read source tree: {}", e);
                    self.record(|s| s.failures += 1);
                    success = false;
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(src) else {
                continue;
            };
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                debug!("Migrating directory {} to {}", entry.path().display(), target.display());
                if let Err(e) = fs::create_dir_all(&target) {
                    warn!("Failed to create directory {}: {}", target.display(), e);
                    self.record(|s| s.failures += 1);
                    success = false;
                    walker.skip_current_dir();
                }
                continue;
            }

            match self.migrate_file(entry.path(), &target) {
                Ok(ok) => success &= ok,
                Err(e) => {
                    warn!("Failed to migrate {}: {}", entry.path().display(), e);
                    self.record(|s| s.failures += 1);
                    success = false;
                }
            }
        }

        Ok(success)
    }

    fn migrate_single(&self, src: &Path, dest: &Path) -> bool {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty())
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create directory {}: {}", parent.display(), e);
            self.record(|s| s.failures += 1);
            return false;
        }

        match self.migrate_file(src, dest) {
            Ok(ok) => ok,
            Err(e) => {
                warn!("Failed to migrate {}: {}", src.display(), e);
                self.record(|s| s.failures += 1);
                false
            }
        }
    }

    /// Migrate one file to `dest`, selecting the handling by file name
    pub fn migrate_file(&self, src: &Path, dest: &Path) -> Result<bool> {
        info!("Migrating {} to {}", src.display(), dest.display());
        self.record(|s| s.files += 1);

        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut input = BufReader::new(File::open(src)?);
        let mut output = BufWriter::new(File::create(dest)?);
        let result = self.migrate_stream(&name, &mut input, &mut output);
        output.flush()?;
        result
    }

    /// Migrate a named stream, consuming `src` to its end
    ///
    /// Returns `Ok(false)` when a nested archive completed with failed
    /// entries. Transformer errors come back as [`Error::Convert`]; stream
    /// faults as [`Error::Io`].
    pub fn migrate_stream(
        &self,
        name: &str,
        src: &mut dyn Read,
        dest: &mut dyn Write,
    ) -> Result<bool> {
        if self.is_excluded(name) {
            debug!("Copying excluded {}", name);
            io::copy(src, dest)?;
            return Ok(true);
        }

        if archive::is_archive(name) {
            let outcome: ArchiveOutcome = archive::migrate_archive(self, name, src, dest)?;
            return Ok(outcome.success);
        }

        let converter = self.chain.select(name);
        debug!("Converting {} ({})", name, converter.name());
        converter
            .convert(name, src, dest)
            .map_err(|e| match e {
                ConvertError::Io(e) => Error::Io(e),
                source => Error::Convert {
                    name: name.to_string(),
                    source,
                },
            })?;
        Ok(true)
    }
}
