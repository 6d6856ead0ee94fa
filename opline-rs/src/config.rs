//! Registry configuration.
//!
//! Every registry is built from an explicit [`RegistryConfig`]; there is no
//! process-wide default instance.
//!
//! ```
//! use opline::config::{AmbiguityPolicy, RegistryConfig};
//!
//! let config = RegistryConfig::default()
//!     .with_top_level(10)
//!     .with_warn_mode(false)
//!     .with_ambiguity(AmbiguityPolicy::FirstMatch);
//! assert_eq!(config.top_level, 10);
//! ```
//!
//! # Environment Variables
//!
//! [`RegistryConfig::from_env`] reads:
//!
//! - `OPLINE_REGISTRY_ID` - registry id used in diagnostics
//! - `OPLINE_TOP_LEVEL` - level of non-interactive callers
//! - `OPLINE_WARN` - `true`/`false` (also `1`/`0`, `on`/`off`, `yes`/`no`)
//! - `OPLINE_AMBIGUITY` - `last_match` or `first_match`

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permission::ExecutionLevel;

pub const ENV_REGISTRY_ID: &str = "OPLINE_REGISTRY_ID";
pub const ENV_TOP_LEVEL: &str = "OPLINE_TOP_LEVEL";
pub const ENV_WARN: &str = "OPLINE_WARN";
pub const ENV_AMBIGUITY: &str = "OPLINE_AMBIGUITY";

/// Which sibling wins when several accept the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// The most recently registered matching sibling wins.
    #[default]
    LastMatch,

    /// The earliest registered matching sibling wins.
    FirstMatch,
}

impl FromStr for AmbiguityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "last_match" | "last-match" => Ok(Self::LastMatch),
            "first" | "first_match" | "first-match" => Ok(Self::FirstMatch),
            other => Err(format!("unknown ambiguity policy '{}'", other)),
        }
    }
}

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Identifier used in diagnostics. A random UUID when unset.
    pub id: Option<String>,

    /// Level granted to callers without a principal.
    pub top_level: ExecutionLevel,

    /// Emit advisory diagnostics.
    pub warn_mode: bool,

    /// Tie-break among matching siblings.
    pub ambiguity: AmbiguityPolicy,

    /// Executor name reported for callers without a principal.
    pub system_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id: None,
            top_level: ExecutionLevel::MAX,
            warn_mode: true,
            ambiguity: AmbiguityPolicy::default(),
            system_name: "@system".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_top_level(mut self, level: ExecutionLevel) -> Self {
        self.top_level = level;
        self
    }

    pub fn with_warn_mode(mut self, warn: bool) -> Self {
        self.warn_mode = warn;
        self
    }

    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    pub fn with_system_name(mut self, name: impl Into<String>) -> Self {
        self.system_name = name.into();
        self
    }

    /// Defaults overridden by `OPLINE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `OPLINE_*` keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(id) = lookup(ENV_REGISTRY_ID) {
            config.id = Some(id);
        }
        if let Some(raw) = lookup(ENV_TOP_LEVEL) {
            config.top_level = raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(ENV_TOP_LEVEL, &raw, e.to_string()))?;
        }
        if let Some(raw) = lookup(ENV_WARN) {
            config.warn_mode = parse_flag(&raw)
                .ok_or_else(|| invalid(ENV_WARN, &raw, "expected a boolean".to_string()))?;
        }
        if let Some(raw) = lookup(ENV_AMBIGUITY) {
            config.ambiguity = raw
                .parse()
                .map_err(|reason| invalid(ENV_AMBIGUITY, &raw, reason))?;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
