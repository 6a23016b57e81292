// src/manifest.rs

//! Archive manifest (META-INF/MANIFEST.MF) handling
//!
//! The manifest is a sequence of `Key: Value` headers. The main section comes
//! first; each following section is introduced by a `Name:` header and
//! separated from its neighbours by a blank line. Header lines longer than
//! 72 bytes continue on lines starting with a single space.
//!
//! Migration does two things to a manifest:
//! - appends `-<toolVersion>` to every `Implementation-Version` header
//! - strips signature material (`Signature-Version` and every section that
//!   carries a `*-Digest` header), since digests of rewritten content no
//!   longer match

use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::debug;

/// Reserved name of the manifest entry
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

pub const MANIFEST_VERSION: &str = "Manifest-Version";
pub const IMPLEMENTATION_VERSION: &str = "Implementation-Version";
pub const SIGNATURE_VERSION: &str = "Signature-Version";

/// Header suffix marking a per-entry digest
pub const DIGEST_SUFFIX: &str = "-Digest";

const NAME_HEADER: &str = "Name";
const MAX_LINE_BYTES: usize = 72;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] io::Error),

    #[error("Header at line {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("Invalid header at line {line}: {content:?}")]
    InvalidHeader { line: usize, content: String },

    #[error("Continuation at line {0} does not follow a header")]
    OrphanContinuation(usize),

    #[error("Section starting at line {0} has no Name header")]
    MissingName(usize),
}

/// Check whether an archive entry name is the manifest
pub fn is_manifest_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(MANIFEST_NAME)
}

/// Ordered headers of one manifest section
///
/// Header names compare case-insensitively; insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Set a header, replacing an existing one in place
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any header is a per-entry digest
    fn has_digest(&self) -> bool {
        self.keys().any(|k| is_digest_key(k.as_bytes()))
    }

    fn stamp_version(&mut self, tool_version: &str) {
        if let Some(current) = self.get(IMPLEMENTATION_VERSION) {
            let stamped = format!("{}-{}", current, tool_version);
            self.insert(IMPLEMENTATION_VERSION, stamped);
        }
    }
}

/// A named per-entry section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub attributes: Attributes,
}

/// Parsed manifest document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
    sections: Vec<Section>,
}

/// Result of [`Manifest::migrated`]
#[derive(Debug, Clone)]
pub struct MigratedManifest {
    pub manifest: Manifest,
    /// Signature material was found and removed
    pub signatures_removed: bool,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_attributes(&self) -> &Attributes {
        &self.main
    }

    pub fn main_attributes_mut(&mut self) -> &mut Attributes {
        &mut self.main
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Attributes> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.attributes)
    }

    /// Get or create the section for an entry name
    pub fn section_mut(&mut self, name: &str) -> &mut Attributes {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(i) => i,
            None => {
                self.sections.push(Section {
                    name: name.to_string(),
                    attributes: Attributes::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].attributes
    }

    /// Parse a manifest from a reader
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, ManifestError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(&data)
    }

    /// Parse a manifest document
    pub fn parse(data: &[u8]) -> Result<Self, ManifestError> {
        let mut manifest = Manifest::new();
        // Headers of the section being read, with the line each one starts on
        let mut group: Vec<(usize, Vec<u8>)> = Vec::new();
        let mut seen_main = false;

        for (index, line) in split_lines(data).enumerate() {
            let line_no = index + 1;
            if line.is_empty() {
                manifest.finish_group(&mut group, &mut seen_main)?;
            } else if let Some(rest) = line.strip_prefix(b" ") {
                match group.last_mut() {
                    Some((_, header)) => header.extend_from_slice(rest),
                    None => return Err(ManifestError::OrphanContinuation(line_no)),
                }
            } else {
                group.push((line_no, line.to_vec()));
            }
        }
        manifest.finish_group(&mut group, &mut seen_main)?;

        Ok(manifest)
    }

    fn finish_group(
        &mut self,
        group: &mut Vec<(usize, Vec<u8>)>,
        seen_main: &mut bool,
    ) -> Result<(), ManifestError> {
        // Everything before the first blank line is the main section, even
        // when it holds no headers
        if *seen_main && group.is_empty() {
            return Ok(());
        }

        let first_line = group.first().map(|(line, _)| *line).unwrap_or(0);
        let mut attributes = Attributes::new();
        for (line_no, raw) in group.drain(..) {
            let (key, value) = parse_header(line_no, &raw)?;
            attributes.entries.push((key, value));
        }

        if !*seen_main {
            *seen_main = true;
            self.main = attributes;
            return Ok(());
        }

        match attributes.entries.first() {
            Some((key, _)) if key.eq_ignore_ascii_case(NAME_HEADER) => {
                let (_, name) = attributes.entries.remove(0);
                self.sections.push(Section { name, attributes });
                Ok(())
            }
            _ => Err(ManifestError::MissingName(first_line)),
        }
    }

    /// Serialize the manifest
    ///
    /// `Manifest-Version` is always written first; lines are wrapped at 72
    /// bytes and terminated with CRLF.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(version) = self.main.get(MANIFEST_VERSION) {
            write_header(writer, MANIFEST_VERSION, version)?;
        }
        for (key, value) in self.main.iter() {
            if !key.eq_ignore_ascii_case(MANIFEST_VERSION) {
                write_header(writer, key, value)?;
            }
        }
        writer.write_all(b"\r\n")?;

        for section in &self.sections {
            write_header(writer, NAME_HEADER, &section.name)?;
            for (key, value) in section.attributes.iter() {
                write_header(writer, key, value)?;
            }
            writer.write_all(b"\r\n")?;
        }
        Ok(())
    }

    /// Append `-<tool_version>` to every Implementation-Version header
    ///
    /// Earlier stamps are not detected: stamping twice yields the suffix twice.
    pub fn stamp_version(&mut self, tool_version: &str) {
        self.main.stamp_version(tool_version);
        for section in &mut self.sections {
            section.attributes.stamp_version(tool_version);
        }
    }

    /// Remove all signature material
    ///
    /// Drops `Signature-Version` from the main section and every section
    /// holding a digest header. Returns whether anything was removed.
    pub fn remove_signatures(&mut self) -> bool {
        let mut removed = self.main.remove(SIGNATURE_VERSION).is_some();
        self.sections.retain(|section| {
            if section.attributes.has_digest() {
                debug!("Removing signature section: {}", section.name);
                removed = true;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Build the migrated form of this manifest
    ///
    /// Works on a fresh copy; `self` is left untouched.
    pub fn migrated(&self, tool_version: &str) -> MigratedManifest {
        let mut manifest = self.clone();
        manifest.stamp_version(tool_version);
        let signatures_removed = manifest.remove_signatures();
        MigratedManifest {
            manifest,
            signatures_removed,
        }
    }
}

/// Strip signature material from a manifest that does not parse
///
/// Works on raw lines and leaves every other byte as it was: the main
/// section loses its `Signature-Version` header (with any continuation
/// lines), and each later section holding a digest header is dropped along
/// with its trailing blank lines. Returns the stripped document and whether
/// anything was removed.
pub fn strip_signature_lines(data: &[u8]) -> (Vec<u8>, bool) {
    let mut out = Vec::with_capacity(data.len());
    let mut removed = false;
    let mut block: Vec<&[u8]> = Vec::new();
    let mut main = true;
    let mut after_blank = false;

    for line in raw_lines(data) {
        let blank = trim_terminator(line).is_empty();
        if !blank && after_blank {
            removed |= strip_block(&block, main, &mut out);
            block.clear();
            main = false;
            after_blank = false;
        }
        after_blank |= blank;
        block.push(line);
    }
    removed |= strip_block(&block, main, &mut out);

    (out, removed)
}

/// Copy one section's raw lines minus its signature material
fn strip_block(lines: &[&[u8]], main: bool, out: &mut Vec<u8>) -> bool {
    if main {
        let mut removed = false;
        let mut skipping = false;
        for line in lines {
            let content = trim_terminator(line);
            if !content.starts_with(b" ") {
                skipping = header_key(content).eq_ignore_ascii_case(SIGNATURE_VERSION.as_bytes());
                removed |= skipping;
            }
            if !skipping {
                out.extend_from_slice(line);
            }
        }
        return removed;
    }

    let signed = lines.iter().map(|line| trim_terminator(line)).any(|content| {
        !content.starts_with(b" ") && is_digest_key(header_key(content))
    });
    if signed {
        debug!("Removing signature section from unparseable manifest");
    } else {
        for line in lines {
            out.extend_from_slice(line);
        }
    }
    signed
}

fn is_digest_key(key: &[u8]) -> bool {
    key.len() >= DIGEST_SUFFIX.len()
        && key[key.len() - DIGEST_SUFFIX.len()..].eq_ignore_ascii_case(DIGEST_SUFFIX.as_bytes())
}

/// Header name of a raw line; the whole line when there is no colon
fn header_key(line: &[u8]) -> &[u8] {
    match line.iter().position(|&b| b == b':') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Split on CRLF, LF or CR, keeping the terminators
fn raw_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = data;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = match rest.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) if rest[i] == b'\r' && rest.get(i + 1) == Some(&b'\n') => i + 2,
            Some(i) => i + 1,
            None => rest.len(),
        };
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Split on CRLF, LF or CR, dropping the terminators
fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    raw_lines(data).map(trim_terminator)
}

fn parse_header(line_no: usize, raw: &[u8]) -> Result<(String, String), ManifestError> {
    let text = std::str::from_utf8(raw).map_err(|_| ManifestError::InvalidUtf8(line_no))?;
    match text.split_once(": ") {
        Some((key, value)) if !key.is_empty() && !key.contains(' ') => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(ManifestError::InvalidHeader {
            line: line_no,
            content: text.to_string(),
        }),
    }
}

fn write_header<W: Write + ?Sized>(writer: &mut W, key: &str, value: &str) -> io::Result<()> {
    let line = format!("{}: {}", key, value);
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    let mut first = true;

    while !rest.is_empty() {
        let mut cut = rest.len().min(limit);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            writer.write_all(b" ")?;
        }
        writer.write_all(rest[..cut].as_bytes())?;
        writer.write_all(b"\r\n")?;
        rest = &rest[cut..];
        // Continuation lines spend one byte on the leading space
        limit = MAX_LINE_BYTES - 1;
        first = false;
    }
    Ok(())
}
