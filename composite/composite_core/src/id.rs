//! Strongly-typed identifiers for composites and bundles.
//!
//! Both kinds of identifier are 64-bit integers assigned by the framework.
//! A phantom type parameter keeps a composite id from being passed where a
//! bundle id is expected.
//!
//! # Examples
//!
//! ```
//! use composite_core::id::{BundleId, CompositeId};
//!
//! let composite = CompositeId::new(3);
//! let bundle = BundleId::new(3);
//!
//! assert_eq!(composite.value(), bundle.value());
//! assert!(CompositeId::ROOT.is_root());
//! assert!(BundleId::SYSTEM.is_system());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// A type-safe 64-bit identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create an identifier from its raw value.
    pub const fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Get the raw value.
    pub const fn value(&self) -> u64 {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> FromStr for Id<T> {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self::new)
    }
}

impl<T> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

/// Marker type for composite identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeMarker;

/// Marker type for bundle identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleMarker;

/// Identifier of a composite. Id 0 is the root composite.
pub type CompositeId = Id<CompositeMarker>;

/// Identifier of a bundle. Id 0 is the system bundle of its composite.
pub type BundleId = Id<BundleMarker>;

impl Id<CompositeMarker> {
    /// The root composite.
    pub const ROOT: Self = Self::new(0);

    /// Check whether this is the root composite.
    pub fn is_root(&self) -> bool {
        self.value == 0
    }
}

impl Id<BundleMarker> {
    /// The system bundle of a composite.
    pub const SYSTEM: Self = Self::new(0);

    /// Check whether this is a system bundle id.
    pub fn is_system(&self) -> bool {
        self.value == 0
    }
}
