//! Configuration management for Warden
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (WARDEN_* prefix, highest precedence)
//! 2. warden.local.toml (gitignored, local overrides)
//! 3. warden.toml (git-tracked, project config)
//! 4. ~/.config/warden/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! Rules carry code and are never configured here; the configuration
//! names the authorizer, toggles decision logging, and lists the field masks
//! applied to allowed resources.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use warden_abac::authorizer::DEFAULT_AUTHORIZER_NAME;
use warden_abac::{AccessRule, AttributePath, Authorizer};
use warden_masking::{FieldMask, MaskingPolicy};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Main Warden configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub authorizer: AuthorizerConfig,
    pub masking: MaskingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Label attached to decision log events.
    pub name: String,
    /// Emit one log event per decision.
    pub log_decisions: bool,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHORIZER_NAME.to_string(),
            log_decisions: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Field masks, applied in order.
    pub fields: Vec<FieldMask>,
}

impl WardenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Build an authorizer with this configuration around `default_chain`.
    pub fn build_authorizer(&self, default_chain: impl Into<Vec<AccessRule>>) -> Authorizer {
        let authorizer = Authorizer::new(default_chain).with_name(&self.authorizer.name);
        if self.authorizer.log_decisions {
            authorizer
        } else {
            authorizer.without_decision_log()
        }
    }

    /// The configured field masks as a policy.
    pub fn masking_policy(&self) -> MaskingPolicy {
        self.masking.fields.iter().cloned().collect()
    }

    /// Check invariants that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authorizer.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "authorizer.name must not be empty".to_string(),
            ));
        }

        for (index, mask) in self.masking.fields.iter().enumerate() {
            if AttributePath::from_dotted(&mask.field).is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "masking.fields[{index}] has an empty field path"
                )));
            }
        }

        Ok(())
    }

    /// Render as TOML, e.g. to write a starter `warden.toml`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
