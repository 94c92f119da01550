//! Configuration loader with multi-source merging

use crate::{Paths, WardenConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default prefix for environment overrides (`WARDEN_*`).
pub const DEFAULT_ENV_PREFIX: &str = "WARDEN";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
    env_vars: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            user_config: true,
            env_vars: None,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "WARDEN")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip the user config file (~/.config/warden/config.toml)
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Read environment overrides from `vars` instead of the process
    /// environment
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<WardenConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = WardenConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/warden/config.toml)
        if self.user_config
            && let Ok(user_config_file) = Paths::new().user_config_file()
        {
            builder = add_file(builder, user_config_file);
        }

        // 3. Project config (warden.toml)
        builder = add_file(builder, Paths::project_config_file(&self.project_dir));

        // 4. Local config (warden.local.toml, gitignored)
        builder = add_file(builder, Paths::local_config_file(&self.project_dir));

        // 5. Environment variables (WARDEN_*, `__` separates nested keys)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_vars),
        );

        // Build, deserialize, validate
        let config = builder.build().context("Failed to build configuration")?;

        let warden_config: WardenConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        warden_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(warden_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn add_file(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    path: PathBuf,
) -> config::ConfigBuilder<config::builder::DefaultState> {
    if !path.exists() {
        return builder;
    }

    debug!(path = %path.display(), "Adding configuration file");
    builder.add_source(
        config::File::from(path)
            .required(false)
            .format(config::FileFormat::Toml),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use warden_masking::{MaskingStrategy, RedactPattern};

    fn loader(project_dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(project_dir)
            .without_user_config()
            .with_env_vars(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config.authorizer.name, "default");
        assert!(config.authorizer.log_decisions);
        assert!(config.masking.fields.is_empty());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[authorizer]
name = "people-api"
log_decisions = false

[[masking.fields]]
field = "ssn"
strategy = { keep-last = { chars = 4 } }

[[masking.fields]]
field = "contact.email"
strategy = { redact = "email" }
"#;
        fs::write(project_dir.join("warden.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.authorizer.name, "people-api");
        assert!(!config.authorizer.log_decisions);
        assert_eq!(config.masking.fields.len(), 2);
        assert_eq!(config.masking.fields[0].field, "ssn");
        assert_eq!(
            config.masking.fields[0].strategy,
            MaskingStrategy::KeepLast { chars: 4 }
        );
        assert_eq!(
            config.masking.fields[1].strategy,
            MaskingStrategy::Redact(RedactPattern::Email)
        );
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("warden.toml"),
            r#"
[authorizer]
name = "people-api"
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("warden.local.toml"),
            r#"
[authorizer]
name = "people-api-dev"
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.authorizer.name, "people-api-dev");
    }

    #[test]
    fn test_env_overrides_files() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("warden.toml"),
            r#"
[authorizer]
name = "people-api"
log_decisions = true
"#,
        )
        .expect("Failed to write project config");

        let config = loader(project_dir)
            .with_env_vars([
                ("WARDEN_AUTHORIZER__NAME", "from-env"),
                ("WARDEN_AUTHORIZER__LOG_DECISIONS", "false"),
                ("OTHER_AUTHORIZER__NAME", "ignored"),
            ])
            .load()
            .expect("Failed to load config");

        assert_eq!(config.authorizer.name, "from-env");
        assert!(!config.authorizer.log_decisions);
    }

    #[test]
    fn test_custom_env_prefix() {
        let temp_dir = tempdir().expect("Failed to create temp dir");

        let config = loader(temp_dir.path())
            .with_env_prefix("ACME")
            .with_env_vars([("ACME_AUTHORIZER__NAME", "acme")])
            .load()
            .expect("Failed to load config");

        assert_eq!(config.authorizer.name, "acme");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("warden.toml"),
            r#"
[[masking.fields]]
field = ""
strategy = "null"
"#,
        )
        .expect("Failed to write project config");

        let err = loader(project_dir).load().unwrap_err();
        assert!(format!("{err:#}").contains("empty field path"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(project_dir.join("warden.toml"), "[authorizer\nname = ")
            .expect("Failed to write project config");

        assert!(loader(project_dir).load().is_err());
    }

    #[test]
    fn test_one_bad_mask_fails_whole_load() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("warden.toml"),
            r#"
[[masking.fields]]
field = "ssn"
strategy = { keep-last = { chars = 4 } }

[[masking.fields]]
field = ""
strategy = "null"
"#,
        )
        .expect("Failed to write project config");

        // No partial or default config that would drop the ssn mask
        let err = loader(project_dir).load().unwrap_err();
        assert!(format!("{err:#}").contains("masking.fields[1]"));
    }
}
