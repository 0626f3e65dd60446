//! Error types for the composite scope policy engine.
//!
//! The errors are organized by subsystem. The root error type, `Error`,
//! wraps each subsystem error so callers can propagate everything with `?`.
//!
//! Visibility queries never fail because a policy denies access; a denial is
//! simply `false`. Errors are reserved for programming errors (a missing
//! client, an unknown provider kind, orphaning a composite that still has
//! children) and for malformed declarations or configuration.

use crate::filter::FilterParseError;
use crate::id::{BundleId, CompositeId};
use crate::utils::version::VersionParseError;
use thiserror::Error;

/// Root error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Scope and composite tree errors
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    /// Sharing policy declaration errors
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the visibility façade and the composite tree.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The client of a visibility query is not installed
    #[error("Client bundle not found: {0}")]
    ClientNotFound(BundleId),

    /// The provider is of a kind no policy vector covers
    #[error("Unknown provider kind: {0}")]
    UnknownProviderKind(String),

    /// No composite with the given ID is in the tree
    #[error("Composite not found: {0}")]
    CompositeNotFound(CompositeId),

    /// A composite with the given ID is already installed
    #[error("Composite already exists: {0}")]
    CompositeExists(CompositeId),

    /// Composite IDs must increase from parent to child
    #[error("Composite {id} cannot be installed under parent {parent}")]
    InvalidCompositeId { id: CompositeId, parent: CompositeId },

    /// A composite cannot be orphaned while it still has children
    #[error("Composite {0} still has children")]
    HasChildren(CompositeId),

    /// The root composite cannot be orphaned
    #[error("The root composite cannot be removed")]
    RootImmutable,

    /// The composite has already been orphaned
    #[error("Composite {0} has been orphaned")]
    Orphaned(CompositeId),
}

/// Errors in sharing policy headers or composite manifests.
#[derive(Debug, Error)]
pub enum DeclarationError {
    /// A required header is missing
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// A header that is not allowed on a composite is present
    #[error("Header not allowed on a composite: {0}")]
    InvalidHeader(String),

    /// Composites must use manifest version 2
    #[error("Unsupported manifest version: {0}")]
    InvalidManifestVersion(String),

    /// A header value could not be parsed
    #[error("Syntax error in {header}: {reason}")]
    Syntax { header: String, reason: String },

    /// A version or version range could not be parsed
    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] VersionParseError),

    /// A service filter could not be parsed
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterParseError),

    /// The parent peer sentinel was used outside a class-space import policy
    #[error("The <<parent>> peer is only allowed on import policies, found in {header}")]
    IllegalParentPeer { header: String },
}

/// Errors in engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration is invalid
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<VersionParseError> for Error {
    fn from(err: VersionParseError) -> Self {
        Error::Declaration(err.into())
    }
}

impl From<FilterParseError> for Error {
    fn from(err: FilterParseError) -> Self {
        Error::Declaration(err.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(ConfigError::Parse(err.to_string()))
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
