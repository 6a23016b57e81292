// src/convert/class.rs

//! Class file constant pool rewriting
//!
//! Only `CONSTANT_Utf8` entries are touched: their bytes go through the
//! namespace table and the stored length is recomputed. The constant count
//! and every constant's index stay the same, since the rest of the class
//! file refers to constants by index. Bytes after the constant pool are
//! copied unchanged.

use super::ConvertError;
use crate::namespace::NamespaceTable;
use std::borrow::Cow;
use std::io::{self, BufReader, Read, Write};
use tracing::debug;

/// Class file magic: 0xCAFEBABE
const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

const CONSTANT_UTF8: u8 = 1;
const CONSTANT_INTEGER: u8 = 3;
const CONSTANT_FLOAT: u8 = 4;
const CONSTANT_LONG: u8 = 5;
const CONSTANT_DOUBLE: u8 = 6;
const CONSTANT_CLASS: u8 = 7;
const CONSTANT_STRING: u8 = 8;
const CONSTANT_FIELDREF: u8 = 9;
const CONSTANT_METHODREF: u8 = 10;
const CONSTANT_INTERFACE_METHODREF: u8 = 11;
const CONSTANT_NAME_AND_TYPE: u8 = 12;
const CONSTANT_METHOD_HANDLE: u8 = 15;
const CONSTANT_METHOD_TYPE: u8 = 16;
const CONSTANT_DYNAMIC: u8 = 17;
const CONSTANT_INVOKE_DYNAMIC: u8 = 18;
const CONSTANT_MODULE: u8 = 19;
const CONSTANT_PACKAGE: u8 = 20;

/// Size of the fixed payload following a tag, for non-Utf8 constants
fn payload_size(tag: u8) -> Option<usize> {
    match tag {
        CONSTANT_CLASS | CONSTANT_STRING | CONSTANT_METHOD_TYPE | CONSTANT_MODULE
        | CONSTANT_PACKAGE => Some(2),
        CONSTANT_METHOD_HANDLE => Some(3),
        CONSTANT_INTEGER | CONSTANT_FLOAT | CONSTANT_FIELDREF | CONSTANT_METHODREF
        | CONSTANT_INTERFACE_METHODREF | CONSTANT_NAME_AND_TYPE | CONSTANT_DYNAMIC
        | CONSTANT_INVOKE_DYNAMIC => Some(4),
        CONSTANT_LONG | CONSTANT_DOUBLE => Some(8),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ClassConverter {
    table: NamespaceTable,
}

impl ClassConverter {
    pub fn new(table: NamespaceTable) -> Self {
        Self { table }
    }

    pub fn accepts(&self, name: &str) -> bool {
        name.ends_with(".class")
    }

    pub fn convert(
        &self,
        name: &str,
        src: &mut dyn Read,
        dest: &mut dyn Write,
    ) -> Result<(), ConvertError> {
        let mut reader = BufReader::new(src);

        // magic, minor_version, major_version
        let mut header = [0u8; 8];
        reader
            .read_exact(&mut header)
            .map_err(|e| parse_error(e, "header"))?;
        if header[0..4] != MAGIC {
            return Err(ConvertError::InvalidClass(format!(
                "bad magic {:02x?}",
                &header[0..4]
            )));
        }
        dest.write_all(&header)?;

        let pool_count = read_u16(&mut reader).map_err(|e| parse_error(e, "header"))?;
        dest.write_all(&pool_count.to_be_bytes())?;

        let mut rewritten = 0usize;
        let mut index: u16 = 1;
        while index < pool_count {
            let tag = read_u8(&mut reader).map_err(|e| parse_error(e, "constant pool"))?;
            dest.write_all(&[tag])?;

            if tag == CONSTANT_UTF8 {
                let length =
                    read_u16(&mut reader).map_err(|e| parse_error(e, "constant pool"))? as usize;
                let mut value = vec![0u8; length];
                reader
                    .read_exact(&mut value)
                    .map_err(|e| parse_error(e, "constant pool"))?;

                let converted = self.table.convert_bytes(&value);
                let new_length = u16::try_from(converted.len()).map_err(|_| {
                    ConvertError::ConstantTooLong {
                        index,
                        length: converted.len(),
                    }
                })?;
                if let Cow::Owned(_) = converted {
                    rewritten += 1;
                }
                dest.write_all(&new_length.to_be_bytes())?;
                dest.write_all(&converted)?;
                index += 1;
                continue;
            }

            let size = payload_size(tag).ok_or_else(|| {
                ConvertError::InvalidClass(format!("unknown constant tag {} at #{}", tag, index))
            })?;
            let mut payload = [0u8; 8];
            reader
                .read_exact(&mut payload[..size])
                .map_err(|e| parse_error(e, "constant pool"))?;
            dest.write_all(&payload[..size])?;

            // Long and double constants occupy two pool slots
            let slots = if tag == CONSTANT_LONG || tag == CONSTANT_DOUBLE { 2 } else { 1 };
            index = index.saturating_add(slots);
        }

        io::copy(&mut reader, dest)?;
        debug!("Rewrote {} constant(s) in {}", rewritten, name);
        Ok(())
    }
}

/// Running out of data mid-structure means the class itself is cut short;
/// any other read error belongs to the stream
fn parse_error(e: io::Error, section: &str) -> ConvertError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ConvertError::InvalidClass(format!("truncated {}", section))
    } else {
        ConvertError::Io(e)
    }
}

fn read_u8(reader: &mut impl Read) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u16(reader: &mut impl Read) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}
