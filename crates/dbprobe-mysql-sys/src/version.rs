//! Server version parsing and gating.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Statement digest tables in `performance_schema` first shipped in 5.6.5.
pub const DIGEST_TABLES_VERSION: MySqlVersion = MySqlVersion {
    major: 5,
    minor: 6,
    patch: 5,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("version string '{0}' has no {1} component")]
    MissingComponent(String, &'static str),

    #[error("invalid {component} component '{value}'")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
}

/// A `(major, minor, patch)` triple. Ordering is lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MySqlVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MySqlVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Whether this server is strictly newer than 5.6.5.
    pub fn has_digest_tables(&self) -> bool {
        *self > DIGEST_TABLES_VERSION
    }
}

impl fmt::Display for MySqlVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn leading_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+)").expect("Failed to compile patch level pattern"))
}

fn component(value: &str, name: &'static str) -> Result<u32, VersionParseError> {
    value.parse().map_err(|_| VersionParseError::InvalidComponent {
        component: name,
        value: value.to_string(),
    })
}

impl FromStr for MySqlVersion {
    type Err = VersionParseError;

    /// Parses `VERSION()` output such as `5.6.17`, `5.7.30-log` or `5.0.51a`.
    ///
    /// Anything after the first `-` is dropped. Only the leading digits of the
    /// patch level count.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let numeric = raw.split('-').next().unwrap_or_default();
        let mut parts = numeric.split('.');

        let mut next = |name: &'static str| {
            parts
                .next()
                .ok_or_else(|| VersionParseError::MissingComponent(raw.to_string(), name))
        };

        let major = component(next("major")?, "major")?;
        let minor = component(next("minor")?, "minor")?;
        let patch_raw = next("patch")?;

        let patch = leading_digits()
            .captures(patch_raw)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| VersionParseError::InvalidComponent {
                component: "patch",
                value: patch_raw.to_string(),
            })
            .and_then(|digits| component(digits.as_str(), "patch"))?;

        Ok(Self { major, minor, patch })
    }
}
