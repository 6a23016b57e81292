// src/archive/mod.rs
//! Zip-based container handling
//!
//! Recognises the container types that are migrated recursively and the
//! signature files that must not survive a rewrite. The codec itself lives
//! in [`codec`].

mod codec;

pub use codec::{ArchiveOutcome, migrate_archive};

/// Reserved metadata directory inside a container
pub const META_INF: &str = "META-INF/";

/// Container types migrated entry by entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Java archive (.jar)
    Jar,
    /// Web application archive (.war)
    War,
    /// Plain zip (.zip)
    Zip,
}

impl ArchiveFormat {
    /// Detect a container type from a file or entry name
    ///
    /// # Examples
    /// ```
    /// use jakarta_migrate::archive::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_extension("lib/servlet-api.jar"), Some(ArchiveFormat::Jar));
    /// assert_eq!(ArchiveFormat::from_extension("ROOT.WAR"), Some(ArchiveFormat::War));
    /// assert_eq!(ArchiveFormat::from_extension("web.xml"), None);
    /// ```
    pub fn from_extension(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".jar") {
            Some(Self::Jar)
        } else if lower.ends_with(".war") {
            Some(Self::War)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::War => "war",
            Self::Zip => "zip",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Check whether a name denotes a container to recurse into
pub fn is_archive(name: &str) -> bool {
    ArchiveFormat::from_extension(name).is_some()
}

/// Check whether an entry is a signature file (`.SF`, `.RSA` or `.DSA`
/// anywhere under `META-INF/`)
pub fn is_signature_file(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    let Some(path) = upper.strip_prefix(META_INF) else {
        return false;
    };
    let file_name = path.rsplit_once('/').map_or(path, |(_, base)| base);
    [".SF", ".RSA", ".DSA"]
        .iter()
        .any(|ext| file_name.len() > ext.len() && file_name.ends_with(ext))
}
