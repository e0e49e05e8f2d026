use super::{GistwatchConfig, smart_load};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Values given on the command line; `None` leaves the layered value alone
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub interval_secs: Option<u64>,
}

impl CliOverrides {
    fn is_empty(&self) -> bool {
        self.db.is_none() && self.token.is_none() && self.username.is_none() && self.interval_secs.is_none()
    }

    /// Nested document holding only the keys that were given
    fn to_value(&self) -> Value {
        let mut feed = Map::new();
        if let Some(token) = &self.token {
            feed.insert("token".to_string(), Value::from(token.as_str()));
        }
        if let Some(username) = &self.username {
            feed.insert("username".to_string(), Value::from(username.as_str()));
        }

        let mut root = Map::new();
        if !feed.is_empty() {
            root.insert("feed".to_string(), Value::Object(feed));
        }
        if let Some(secs) = self.interval_secs {
            root.insert("scan".to_string(), serde_json::json!({ "interval_secs": secs }));
        }
        if let Some(db) = &self.db {
            root.insert("storage".to_string(), serde_json::json!({ "path": db }));
        }
        Value::Object(root)
    }
}

const CONFIG_FILE_NAMES: &[&str] = &[
    "gistwatch.toml",
    ".gistwatch.toml",
    "gistwatch.yaml",
    "gistwatch.yml",
    "gistwatch.json",
];

impl GistwatchConfig {
    /// Load configuration using the standard discovery order
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    /// Load configuration, preferring `custom_config` over discovery
    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        Self::load_with_overrides(custom_config, &CliOverrides::default())
    }

    /// Load configuration and apply command-line values last
    pub fn load_with_overrides(custom_config: Option<&str>, overrides: &CliOverrides) -> Result<Self> {
        let config_file = match custom_config {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path)
            }
            None => find_config_file(),
        };

        let mut figment = Self::figment(config_file.as_deref());
        if !overrides.is_empty() {
            figment = figment.merge(Serialized::defaults(overrides.to_value()));
        }

        let config: GistwatchConfig = figment
            .extract()
            .context("Failed to load configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Build the layered figment: defaults, then file, then environment
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(path) = config_file {
            tracing::debug!("Loading config file: {}", path.display());
            figment = figment.merge(smart_load::auto(path));
        }

        // Environment beats the file; CLI overrides are merged on top by the caller
        figment.merge(Env::prefixed("GISTWATCH_").split("__"))
    }
}

/// Find a configuration file in the current directory or its parents
pub fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
