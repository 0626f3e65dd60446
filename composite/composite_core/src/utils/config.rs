//! Engine configuration.
//!
//! Handles loading and validating the scope policy configuration from TOML.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ConfigError, Result};
use crate::utils::LogLevel;

lazy_static! {
    /// Framework services that must stay scoped even for the root system bundle.
    pub static ref DEFAULT_SCOPED_SYSTEM_SERVICES: Vec<&'static str> = vec![
        "org.osgi.service.url.URLStreamHandlerService",
        "java.net.ContentHandler",
        "org.osgi.framework.hooks.service.EventHook",
        "org.osgi.framework.hooks.service.FindHook",
        "org.osgi.framework.hooks.service.ListenerHook",
    ];
}

/// Scope policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Service interfaces the root system bundle bypass never applies to
    #[serde(default = "default_scoped_system_services")]
    pub scoped_system_services: Vec<String>,

    /// Whether visibility decisions are recorded in the audit log
    #[serde(default)]
    pub audit_enabled: bool,

    /// Audit entries kept per client bundle
    #[serde(default = "default_max_audit_entries")]
    pub max_audit_entries_per_bundle: usize,

    /// Level at which visibility decisions are logged
    #[serde(default)]
    pub decision_log_level: LogLevel,
}

fn default_scoped_system_services() -> Vec<String> {
    DEFAULT_SCOPED_SYSTEM_SERVICES
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_max_audit_entries() -> usize {
    1000
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            scoped_system_services: default_scoped_system_services(),
            audit_enabled: false,
            max_audit_entries_per_bundle: default_max_audit_entries(),
            decision_log_level: LogLevel::default(),
        }
    }
}

impl ScopeConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScopeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// A missing file is not an error: the defaults are used instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading scope configuration from {}", path.display());

        if !path.exists() {
            warn!("Configuration file not found: {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self
            .scoped_system_services
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(
                ConfigError::Invalid("Scoped service names cannot be empty".to_string()).into(),
            );
        }

        if self.audit_enabled && self.max_audit_entries_per_bundle == 0 {
            return Err(ConfigError::Invalid(
                "Audit capacity cannot be zero when auditing is enabled".to_string(),
            )
            .into());
        }

        if self.scoped_system_services.is_empty() {
            warn!(
                "No scoped system services configured, the root system bundle sees every service"
            );
        }

        if !self.decision_log_level.is_compiled_in() {
            warn!(
                level = %self.decision_log_level,
                "Visibility decisions are logged below the compiled-in maximum level"
            );
        }

        Ok(())
    }

    /// Check whether any of `classes` names a scoped system service.
    pub fn is_scoped(&self, classes: &[&str]) -> bool {
        classes.iter().any(|class| {
            self.scoped_system_services
                .iter()
                .any(|scoped| scoped == class)
        })
    }
}
