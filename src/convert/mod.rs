// src/convert/mod.rs
//! Content transformers
//!
//! Each transformer accepts or declines a stream by its name and, when it
//! accepts, rewrites the whole stream from input to output in one sequential
//! pass. Transformers are tried in a fixed priority order and the first one
//! that accepts a name wins:
//!
//! 1. [`TextConverter`] - descriptors, sources and configuration files
//! 2. [`ClassConverter`] - compiled class files
//! 3. pass-through - everything else is copied unchanged

mod class;
mod text;

pub use class::ClassConverter;
pub use text::TextConverter;

use crate::namespace::NamespaceTable;
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid class file: {0}")]
    InvalidClass(String),

    #[error("Constant #{index} grows to {length} bytes, above the 65535 byte limit")]
    ConstantTooLong { index: u16, length: usize },
}

/// A content transformer
#[derive(Debug, Clone)]
pub enum Converter {
    Text(TextConverter),
    Class(ClassConverter),
    /// Identity copy
    PassThrough,
}

impl Converter {
    /// Get a short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Class(_) => "class",
            Self::PassThrough => "pass-through",
        }
    }

    /// Check whether this transformer handles a stream with the given name
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::Text(c) => c.accepts(name),
            Self::Class(c) => c.accepts(name),
            Self::PassThrough => true,
        }
    }

    /// Rewrite `src` into `dest`, consuming the whole input
    pub fn convert(
        &self,
        name: &str,
        src: &mut dyn Read,
        dest: &mut dyn Write,
    ) -> Result<(), ConvertError> {
        match self {
            Self::Text(c) => c.convert(src, dest),
            Self::Class(c) => c.convert(name, src, dest),
            Self::PassThrough => {
                io::copy(src, dest)?;
                Ok(())
            }
        }
    }
}

static PASS_THROUGH: Converter = Converter::PassThrough;

/// Ordered transformer list; the first acceptor wins
#[derive(Debug, Clone)]
pub struct ConverterChain {
    converters: Vec<Converter>,
}

impl ConverterChain {
    /// The standard chain: text, class, then pass-through
    pub fn new(table: NamespaceTable) -> Self {
        Self {
            converters: vec![
                Converter::Text(TextConverter::new(table)),
                Converter::Class(ClassConverter::new(table)),
                Converter::PassThrough,
            ],
        }
    }

    /// Select the transformer for a name
    pub fn select(&self, name: &str) -> &Converter {
        self.converters
            .iter()
            .find(|c| c.accepts(name))
            .unwrap_or(&PASS_THROUGH)
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Profile;

    #[test]
    fn test_select_priority() {
        let chain = ConverterChain::new(Profile::Tomcat.table());
        assert_eq!(chain.select("WEB-INF/web.xml").name(), "text");
        assert_eq!(chain.select("org/example/Foo.class").name(), "class");
        assert_eq!(chain.select("images/logo.png").name(), "pass-through");
        assert_eq!(chain.converters().len(), 3);
    }

    #[test]
    fn test_pass_through_copies_bytes() {
        let chain = ConverterChain::new(Profile::Tomcat.table());
        let input = b"\x89PNG javax.servlet stays";
        let mut out = Vec::new();
        chain
            .select("logo.png")
            .convert("logo.png", &mut &input[..], &mut out)
            .unwrap();
        assert_eq!(out, input);
    }
}
