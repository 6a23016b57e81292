// src/namespace.rs

//! Legacy to successor namespace tables
//!
//! A [`Profile`] selects which `javax` packages count as legacy for a run.
//! The Tomcat profile only covers the specifications Tomcat implements; the
//! EE profile covers the full platform. Both rewrite `javax.<pkg>` and
//! `javax/<pkg>` to `jakarta.<pkg>` / `jakarta/<pkg>`, keeping the separator.
//!
//! Matching operates on bytes, so class constants, descriptors and text in
//! any ASCII-compatible encoding share one code path.

use crate::error::Error;
use regex::bytes::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Legacy prefix being migrated away from
pub const LEGACY_PREFIX: &str = "javax";

/// Successor prefix written in its place
pub const SUCCESSOR_PREFIX: &str = "jakarta";

/// Packages implemented by Tomcat
const TOMCAT_PACKAGES: &[&str] = &[
    "annotation",
    "ejb",
    "el",
    "mail",
    "persistence",
    "security[/.]auth[/.]message",
    "servlet",
    "transaction",
    "websocket",
];

/// Additional packages of the full platform
const EE_PACKAGES: &[&str] = &[
    "activation",
    "batch",
    "decorator",
    "enterprise",
    "faces",
    "inject",
    "interceptor",
    "jms",
    "json",
    "jws",
    "management[/.]j2ee",
    "resource",
    "security[/.]enterprise",
    "security[/.]jacc",
    "validation",
    "ws[/.]rs",
    "xml[/.]bind",
    "xml[/.]soap",
    "xml[/.]ws",
];

/// Java SE packages sharing a legacy prefix; never rewritten
const SE_PACKAGES: &[&str] = &["annotation[/.]processing", "transaction[/.]xa"];

static TOMCAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| build_pattern(TOMCAT_PACKAGES.iter().copied()));

static EE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    build_pattern(TOMCAT_PACKAGES.iter().chain(EE_PACKAGES.iter()).copied())
});

fn build_pattern<'a>(packages: impl Iterator<Item = &'a str>) -> Regex {
    let packages: Vec<&str> = packages.collect();
    let pattern = format!(
        r"{}[/.](?:(?P<se>{})|(?:{}))(?-u:\b)",
        LEGACY_PREFIX,
        SE_PACKAGES.join("|"),
        packages.join("|")
    );
    Regex::new(&pattern).expect("namespace table compiles to a valid pattern")
}

/// Specification level selecting the active namespace table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Specifications implemented by Tomcat
    #[default]
    Tomcat,
    /// The complete platform
    Ee,
}

impl Profile {
    /// Get the profile name as used on the command line
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tomcat => "tomcat",
            Self::Ee => "ee",
        }
    }

    /// Get the namespace table for this profile
    pub fn table(&self) -> NamespaceTable {
        NamespaceTable { profile: *self }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tomcat" => Ok(Self::Tomcat),
            "ee" => Ok(Self::Ee),
            _ => Err(Error::InvalidProfile(s.to_string())),
        }
    }
}

/// The rewrite rules of one profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceTable {
    profile: Profile,
}

impl NamespaceTable {
    pub fn profile(&self) -> Profile {
        self.profile
    }

    fn pattern(&self) -> &'static Regex {
        match self.profile {
            Profile::Tomcat => &TOMCAT_PATTERN,
            Profile::Ee => &EE_PATTERN,
        }
    }

    /// Rewrite every legacy occurrence in a byte string
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    pub fn convert_bytes<'a>(&self, input: &'a [u8]) -> Cow<'a, [u8]> {
        self.pattern().replace_all(input, |caps: &Captures| {
            let whole = &caps[0];
            if caps.name("se").is_some() {
                return whole.to_vec();
            }
            let mut out = Vec::with_capacity(whole.len() + 2);
            out.extend_from_slice(SUCCESSOR_PREFIX.as_bytes());
            out.extend_from_slice(&whole[LEGACY_PREFIX.len()..]);
            out
        })
    }

    /// Rewrite every legacy occurrence in a string (entry names, paths)
    pub fn convert<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match self.convert_bytes(input.as_bytes()) {
            Cow::Borrowed(_) => Cow::Borrowed(input),
            // Only ASCII was substituted, so the result stays valid UTF-8
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Check whether the input contains anything this table would rewrite
    pub fn matches(&self, input: &[u8]) -> bool {
        matches!(self.convert_bytes(input), Cow::Owned(_))
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Profile::default().table()
    }
}
