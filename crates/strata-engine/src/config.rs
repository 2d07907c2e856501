//! Engine configuration, loaded from `[engine]` in `strata.toml`

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::warning::{DenyWarnings, DismissWarnings, LogWarnings, WarningHandler};

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// What the engine does with validation warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningPolicy {
    /// Log through `tracing` and continue
    #[default]
    Log,
    /// Drop silently
    Dismiss,
    /// Fail the declaration
    Deny,
}

impl WarningPolicy {
    /// Built-in handler implementing this policy
    pub fn handler(self) -> Box<dyn WarningHandler> {
        match self {
            WarningPolicy::Log => Box::new(LogWarnings),
            WarningPolicy::Dismiss => Box::new(DismissWarnings),
            WarningPolicy::Deny => Box::new(DenyWarnings),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Build separate public/protected/private layers per instance.
    /// When off, every member lives in one flat layer and nothing is hidden.
    pub layered_visibility: bool,

    /// Warning policy used when no custom handler is installed
    pub warnings: WarningPolicy,

    /// Reject concrete declarations that leave abstract members unresolved
    /// at declare time rather than at instantiation
    pub strict_abstract: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            layered_visibility: true,
            warnings: WarningPolicy::Log,
            strict_abstract: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

impl EngineConfig {
    /// Parse the `[engine]` table of a `strata.toml` document
    ///
    /// A document without an `[engine]` table yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.engine)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
