// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A manifest carrying a version and signature material
pub const SIGNED_MANIFEST: &str = "Manifest-Version: 1.0\r\n\
Implementation-Version: 5.0\r\n\
Signature-Version: 1.0\r\n\
Created-By: 17 (Acme)\r\n\
\r\n\
Name: org/example/Plain.class\r\n\
Implementation-Version: 5.0\r\n\
\r\n\
Name: javax/servlet/Filter.class\r\n\
SHA-256-Digest: 3q2+7w==\r\n\
\r\n";

pub const PLAIN_MANIFEST: &str =
    "Manifest-Version: 1.0\r\nImplementation-Version: 5.0\r\nCreated-By: 17 (Acme)\r\n\r\n";

/// One fixture entry: name, content, compression
pub type Entry = (String, Vec<u8>, CompressionMethod);

pub fn entry(name: &str, data: &[u8]) -> Entry {
    (name.to_string(), data.to_vec(), CompressionMethod::Deflated)
}

pub fn stored(name: &str, data: &[u8]) -> Entry {
    (name.to_string(), data.to_vec(), CompressionMethod::Stored)
}

/// Build a zip container in memory; names ending in `/` become directories
pub fn build_jar(entries: &[Entry]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, method) in entries {
        let options = SimpleFileOptions::default().compression_method(*method);
        if name.ends_with('/') {
            writer.add_directory(name.as_str(), options).unwrap();
        } else {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Read every entry of a zip container, in order
pub fn read_jar(data: &[u8]) -> Vec<Entry> {
    let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content, file.compression())
        })
        .collect()
}

pub fn entry_names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|(name, _, _)| name.as_str()).collect()
}

pub fn find<'a>(entries: &'a [Entry], name: &str) -> &'a [u8] {
    entries
        .iter()
        .find(|(n, _, _)| n == name)
        .map(|(_, data, _)| data.as_slice())
        .unwrap_or_else(|| panic!("entry {} missing", name))
}

/// A minimal class file whose single method descriptor is `descriptor`
pub fn class_file(this_class: &str, descriptor: &str) -> Vec<u8> {
    let mut class = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 61];
    class.extend_from_slice(&4u16.to_be_bytes());

    // #1 Utf8 this_class, #2 Class #1, #3 Utf8 descriptor
    push_utf8(&mut class, this_class);
    class.push(7);
    class.extend_from_slice(&1u16.to_be_bytes());
    push_utf8(&mut class, descriptor);

    // access flags, this_class, super_class, interfaces, fields, methods, attributes
    class.extend_from_slice(&[0x00, 0x21, 0x00, 0x02, 0x00, 0x00]);
    class.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
    class
}

fn push_utf8(class: &mut Vec<u8>, value: &str) {
    class.push(1);
    class.extend_from_slice(&(value.len() as u16).to_be_bytes());
    class.extend_from_slice(value.as_bytes());
}

/// Check whether a byte string contains `needle`
pub fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}
