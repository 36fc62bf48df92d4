//! Registry configuration.
//!
//! Loaded from YAML, e.g.
//!
//! ```yaml
//! internal_owner: "PassengerAPI (Internal)"
//! dispatch_empty_views: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Owner name used for mutations that no owner session initiated.
pub const DEFAULT_INTERNAL_OWNER: &str = "PassengerAPI (Internal)";

/// Environment variable overriding [`PassengerConfig::internal_owner`].
pub const ENV_INTERNAL_OWNER: &str = "PASSENGER_INTERNAL_OWNER";

/// Environment variable overriding [`PassengerConfig::dispatch_empty_views`].
pub const ENV_DISPATCH_EMPTY: &str = "PASSENGER_DISPATCH_EMPTY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerConfig {
    /// Owner recorded on intent events raised by the manager's internal
    /// operations, and under which those passengers are stored.
    pub internal_owner: String,

    /// Whether a target whose consolidated view became empty still gets a
    /// packet. Sending it clears the passengers on the client.
    pub dispatch_empty_views: bool,
}

impl Default for PassengerConfig {
    fn default() -> Self {
        Self {
            internal_owner: DEFAULT_INTERNAL_OWNER.to_owned(),
            dispatch_empty_views: true,
        }
    }
}

impl PassengerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document. Missing fields take defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup` (keyed by the `ENV_*` names).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(owner) = lookup(ENV_INTERNAL_OWNER) {
            self.internal_owner = owner;
        }
        if let Some(raw) = lookup(ENV_DISPATCH_EMPTY) {
            self.dispatch_empty_views = parse_bool(&raw).ok_or_else(|| {
                ConfigError::Invalid(format!("{ENV_DISPATCH_EMPTY} must be a boolean, got {raw:?}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_owner.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "internal_owner must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
