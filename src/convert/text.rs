// src/convert/text.rs

//! Line-oriented rewriting of human-readable content

use super::ConvertError;
use crate::namespace::NamespaceTable;
use std::io::{BufRead, BufReader, Read, Write};

/// File extensions handled as text
const TEXT_EXTENSIONS: &[&str] = &[
    "java",
    "jsp",
    "jspf",
    "jspx",
    "tag",
    "tagf",
    "tagx",
    "tld",
    "txt",
    "xml",
    "json",
    "properties",
    "groovy",
    "xhtml",
    "html",
    "mf",
    "conf",
    "yaml",
    "yml",
];

/// Service provider registrations hold class names, one per line
const SERVICES_DIR: &str = "META-INF/services/";

#[derive(Debug, Clone)]
pub struct TextConverter {
    table: NamespaceTable,
}

impl TextConverter {
    pub fn new(table: NamespaceTable) -> Self {
        Self { table }
    }

    pub fn accepts(&self, name: &str) -> bool {
        if name.starts_with(SERVICES_DIR) && !name.ends_with('/') {
            return true;
        }
        let file_name = name.rsplit('/').next().unwrap_or(name);
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => TEXT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }

    /// Rewrite line by line, keeping each line terminator as found
    pub fn convert(&self, src: &mut dyn Read, dest: &mut dyn Write) -> Result<(), ConvertError> {
        let mut reader = BufReader::new(src);
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            dest.write_all(&self.table.convert_bytes(&line))?;
        }
        Ok(())
    }
}
