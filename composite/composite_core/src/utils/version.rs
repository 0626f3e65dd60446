//! Version utilities.
//!
//! This module provides the four-part versions used to identify bundles and
//! composites, and the version ranges that sharing policies match against.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Error parsing a version or version range string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError {
    /// The invalid version string.
    pub version: String,

    /// The reason for the error.
    pub reason: String,
}

impl VersionParseError {
    fn new(version: &str, reason: impl Into<String>) -> Self {
        Self {
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid version '{}': {}", self.version, self.reason)
    }
}

impl std::error::Error for VersionParseError {}

/// A bundle or composite version.
///
/// Versions have three numeric components and an optional qualifier:
/// `major.minor.micro.qualifier`. Missing numeric components are zero, so
/// `"1.2"` is the same version as `"1.2.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Version {
    /// Major version number.
    pub major: u32,

    /// Minor version number.
    pub minor: u32,

    /// Micro version number.
    pub micro: u32,

    /// Qualifier, empty if absent.
    pub qualifier: String,
}

impl Version {
    /// Create a new version without a qualifier.
    ///
    /// # Arguments
    ///
    /// * `major` - Major version number.
    /// * `minor` - Minor version number.
    /// * `micro` - Micro version number.
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// The empty version, `0.0.0`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a qualifier to this version.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Check if this is the empty version.
    pub fn is_empty(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.micro == 0 && self.qualifier.is_empty()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0u32; 3];
        for (index, slot) in numbers.iter_mut().enumerate() {
            match parts.next() {
                Some(part) => {
                    *slot = part.parse().map_err(|_| {
                        VersionParseError::new(s, format!("component {} is not a number", index))
                    })?;
                }
                None => break,
            }
        }

        let qualifier = parts.next().unwrap_or_default().to_string();
        if !qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VersionParseError::new(s, "invalid character in qualifier"));
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier,
        })
    }
}

/// A range of versions.
///
/// Ranges are written in interval notation, `[1.0,2.0)`, or as a single
/// version meaning "this version or later".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    /// The lower bound.
    pub minimum: Version,

    /// Whether the lower bound is included.
    pub include_minimum: bool,

    /// The upper bound, if any.
    pub maximum: Option<Version>,

    /// Whether the upper bound is included.
    pub include_maximum: bool,
}

impl VersionRange {
    /// The range matching every version.
    pub fn any() -> Self {
        Self::at_least(Version::empty())
    }

    /// The range of versions at or above `minimum`.
    pub fn at_least(minimum: Version) -> Self {
        Self {
            minimum,
            include_minimum: true,
            maximum: None,
            include_maximum: false,
        }
    }

    /// The range containing exactly `version`.
    pub fn exactly(version: Version) -> Self {
        Self {
            minimum: version.clone(),
            include_minimum: true,
            maximum: Some(version),
            include_maximum: true,
        }
    }

    /// Check whether `version` falls inside this range.
    pub fn includes(&self, version: &Version) -> bool {
        let above_minimum = if self.include_minimum {
            version >= &self.minimum
        } else {
            version > &self.minimum
        };
        if !above_minimum {
            return false;
        }

        match &self.maximum {
            Some(maximum) if self.include_maximum => version <= maximum,
            Some(maximum) => version < maximum,
            None => true,
        }
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.maximum {
            None => write!(f, "{}", self.minimum),
            Some(maximum) => write!(
                f,
                "{}{},{}{}",
                if self.include_minimum { '[' } else { '(' },
                self.minimum,
                maximum,
                if self.include_maximum { ']' } else { ')' }
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let include_minimum = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Ok(Self::at_least(trimmed.parse()?)),
        };
        let include_maximum = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(VersionParseError::new(s, "unterminated range")),
        };

        let body = &trimmed[1..trimmed.len() - 1];
        let (low, high) = body
            .split_once(',')
            .ok_or_else(|| VersionParseError::new(s, "range needs two bounds"))?;
        let minimum: Version = low.parse()?;
        let maximum: Version = high.parse()?;
        if maximum < minimum {
            return Err(VersionParseError::new(s, "upper bound is below lower bound"));
        }

        Ok(Self {
            minimum,
            include_minimum,
            maximum: Some(maximum),
            include_maximum,
        })
    }
}
