//! Utility types.
//!
//! Configuration, logging and version utilities shared by the engine.

pub mod config;
pub mod logging;
pub mod version;

pub use config::ScopeConfig;
pub use logging::LogLevel;
pub use version::{Version, VersionParseError, VersionRange};
