// src/archive/codec.rs

//! Archive rewriting
//!
//! The caller's input stream is read to its end through a non-closing view
//! and parsed in memory, since the zip central directory sits at the end of
//! the container. The rewritten container is assembled in memory as well and
//! then written out through a non-closing view, so the caller's streams are
//! consumed and produced strictly sequentially and stay open afterwards. This
//! is what lets an archive entry that is itself an archive be migrated while
//! the enclosing archive is still mid-iteration.
//!
//! Output layout:
//! - the manifest, migrated, as the first entry
//! - every other entry in input order, renamed through the namespace table
//! - no signature files

use super::is_signature_file;
use crate::error::{Error, Result};
use crate::manifest::{Manifest, is_manifest_name, strip_signature_lines};
use crate::migration::Migration;
use crate::stream::{NonClosingReader, NonClosingWriter};
use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, Write};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::result::ZipError;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

type OutputArchive = ZipWriter<Cursor<Vec<u8>>>;

/// Result of migrating one archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Every entry was migrated without error
    pub success: bool,
    /// Entries written to the output, manifest included
    pub entries: usize,
    /// Signature files skipped
    pub signature_files: usize,
    /// The manifest carried signature material that was stripped
    pub manifest_signed: bool,
}

impl ArchiveOutcome {
    /// The archive carried any signature material
    pub fn signatures_removed(&self) -> bool {
        self.manifest_signed || self.signature_files > 0
    }
}

/// Migrate one zip-based container from `src` into `dest`
///
/// Per-entry recoverable errors are logged and reflected in
/// [`ArchiveOutcome::success`]; I/O faults abort the archive. A container
/// that cannot be parsed at all is copied through unchanged and reported as
/// [`Error::Archive`]. Neither stream is closed.
pub fn migrate_archive(
    migration: &Migration,
    name: &str,
    src: &mut dyn Read,
    dest: &mut dyn Write,
) -> Result<ArchiveOutcome> {
    let mut input = NonClosingReader::new(src);
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    input.close();

    let mut archive = match ZipArchive::new(Cursor::new(&data[..])) {
        Ok(archive) => archive,
        Err(e) => {
            let err = Error::from(e);
            if err.is_recoverable() {
                let mut output = NonClosingWriter::new(dest);
                output.write_all(&data)?;
                output.close()?;
            }
            return Err(err);
        }
    };

    info!("Migrating archive {} ({} entries)", name, archive.len());
    migration.record(|s| s.archives += 1);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut outcome = ArchiveOutcome {
        success: true,
        ..Default::default()
    };

    let manifest_index =
        (0..archive.len()).find(|&i| archive.name_for_index(i).is_some_and(is_manifest_name));
    if let Some(index) = manifest_index {
        match write_manifest(migration, name, &mut archive, index, &mut writer, &mut outcome) {
            Ok(ok) => outcome.success &= ok,
            Err(e) if e.is_recoverable() => {
                warn!("Skipping unreadable manifest of {}: {}", name, e);
                migration.record(|s| s.failures += 1);
                outcome.success = false;
            }
            Err(e) => return Err(e),
        }
    }

    for index in 0..archive.len() {
        if Some(index) == manifest_index {
            continue;
        }

        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry #{} in {}: {}", index, name, e);
                migration.record(|s| s.failures += 1);
                outcome.success = false;
                continue;
            }
        };
        let entry_name = entry.name().to_string();

        if is_signature_file(&entry_name) {
            debug!("Skipping signature file {}", entry_name);
            outcome.signature_files += 1;
            continue;
        }

        let dest_name: Cow<'_, str> = if migration.is_excluded(&entry_name) {
            Cow::Borrowed(&entry_name)
        } else {
            migration.table().convert(&entry_name)
        };
        if dest_name != entry_name {
            debug!("Renaming {} to {}", entry_name, dest_name);
        }

        let options = entry_options(entry.compression(), entry.unix_mode(), entry.last_modified());
        let result = if entry.is_dir() {
            writer
                .add_directory(dest_name.into_owned(), options)
                .map(|()| true)
                .map_err(Error::from)
        } else {
            match read_entry(&mut entry) {
                Ok(content) => match writer.start_file(dest_name.into_owned(), options) {
                    Ok(()) => migration.migrate_stream(&entry_name, &mut &content[..], &mut writer),
                    Err(e) => Err(Error::from(e)),
                },
                Err(e) => Err(e),
            }
        };
        outcome.entries += 1;
        migration.record(|s| s.entries += 1);

        match result {
            Ok(ok) => outcome.success &= ok,
            Err(e) if e.is_recoverable() => {
                warn!("Failed to migrate {} in {}: {}", entry_name, name, e);
                migration.record(|s| s.failures += 1);
                outcome.success = false;
            }
            Err(e) => return Err(e),
        }
    }

    if outcome.signatures_removed() {
        warn!(
            "Removed signature material from {}; the migrated archive is no longer signed",
            name
        );
        migration.record(|s| s.signatures_removed += 1);
    }

    let bytes = writer.finish()?.into_inner();
    let mut output = NonClosingWriter::new(dest);
    output.write_all(&bytes)?;
    output.close()?;

    debug!(
        "Finished archive {}: {} entries, success: {}",
        name, outcome.entries, outcome.success
    );
    Ok(outcome)
}

/// Write the migrated manifest as the first output entry
///
/// A manifest that does not parse is copied with only its signature lines
/// removed and reported as a failed entry.
fn write_manifest<R: Read + Seek>(
    migration: &Migration,
    name: &str,
    archive: &mut ZipArchive<R>,
    index: usize,
    writer: &mut OutputArchive,
    outcome: &mut ArchiveOutcome,
) -> Result<bool> {
    let mut entry = archive.by_index(index).map_err(Error::Archive)?;
    let entry_name = entry.name().to_string();
    let options = entry_options(entry.compression(), entry.unix_mode(), entry.last_modified());
    let raw = read_entry(&mut entry)?;

    writer.start_file(entry_name, options)?;
    outcome.entries += 1;
    migration.record(|s| s.entries += 1);

    match Manifest::parse(&raw) {
        Ok(original) => {
            let migrated = original.migrated(&migration.config().tool_version);
            outcome.manifest_signed = migrated.signatures_removed;
            migrated.manifest.write_to(writer)?;
            Ok(true)
        }
        Err(e) => {
            warn!("Copying unparseable manifest of {} as is: {}", name, e);
            migration.record(|s| s.failures += 1);
            let (stripped, signed) = strip_signature_lines(&raw);
            outcome.manifest_signed = signed;
            writer.write_all(&stripped)?;
            Ok(false)
        }
    }
}

/// Read an entry's content from the in-memory container
///
/// The container bytes are already in memory, so a failed read (bad
/// checksum, corrupt deflate data) is a defect of that entry.
fn read_entry(entry: &mut impl Read) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .map_err(|e| Error::Archive(ZipError::Io(e)))?;
    Ok(content)
}

/// Output options mirroring an input entry
///
/// Stored entries stay stored; everything else is deflated.
fn entry_options(
    compression: CompressionMethod,
    unix_mode: Option<u32>,
    modified: Option<DateTime>,
) -> SimpleFileOptions {
    let method = if compression == CompressionMethod::Stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    let mut options = SimpleFileOptions::default().compression_method(method);
    if let Some(mode) = unix_mode {
        options = options.unix_permissions(mode);
    }
    if let Some(time) = modified {
        options = options.last_modified_time(time);
    }
    options
}
