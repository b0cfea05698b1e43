//! Configuration loading
//!
//! Bootstrap settings come from, in priority order:
//! 1. Command-line arguments (`--port`, `--database`, ...)
//! 2. Environment variables (handled by clap `env` in the binary)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! The disposal policy (rule table and tips) is a separate TOML document;
//! a complete default is compiled in.

use crate::gate::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::rules::{RawRuleTable, RuleTable};
use crate::tips::TipBook;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the TOML bootstrap file
pub const CONFIG_ENV_VAR: &str = "RECYCLO_CONFIG";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Built-in policy document
const BUILTIN_RULES: &str = include_str!("../rules/default_rules.toml");

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 5780
    #[serde(default = "default_port")]
    pub port: u16,

    /// Predictions below this confidence abstain
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,

    /// JSON array of model class names
    #[serde(default)]
    pub class_names_path: Option<PathBuf>,

    /// Policy TOML replacing the built-in rules
    #[serde(default)]
    pub rules_path: Option<PathBuf>,

    /// Inference endpoint; `/api/classify` is disabled without it
    #[serde(default)]
    pub classifier_url: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration; output always goes to stderr
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            host: default_host(),
            port: default_port(),
            confidence_threshold: default_threshold(),
            class_names_path: None,
            rules_path: None,
            classifier_url: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load the bootstrap file, or defaults when `path` is `None`
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
        let config = Self::from_toml_str(&content)?;

        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Apply command-line overrides and fill in derived defaults
    pub fn resolve(self, overrides: ConfigOverrides) -> Settings {
        Settings {
            database_path: overrides
                .database_path
                .or(self.database_path)
                .unwrap_or_else(default_database_path),
            host: overrides.host.unwrap_or(self.host),
            port: overrides.port.unwrap_or(self.port),
            confidence_threshold: overrides
                .confidence_threshold
                .unwrap_or(self.confidence_threshold),
            class_names_path: overrides.class_names_path.or(self.class_names_path),
            rules_path: overrides.rules_path.or(self.rules_path),
            classifier_url: overrides
                .classifier_url
                .or(self.classifier_url)
                .filter(|url| !url.trim().is_empty()),
            log_level: self.logging.level,
        }
    }
}

/// Command-line values that take precedence over the TOML file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub confidence_threshold: Option<f64>,
    pub class_names_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub classifier_url: Option<String>,
}

/// Fully resolved bootstrap settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub confidence_threshold: f64,
    pub class_names_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub classifier_url: Option<String>,
    pub log_level: String,
}

/// Locate the bootstrap file.
///
/// 1. Command-line argument
/// 2. `RECYCLO_CONFIG`
/// 3. `<config dir>/recyclo/config.toml`, if it exists
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("recyclo").join("config.toml"))
        .filter(|path| path.exists())
}

/// OS-dependent data folder
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "macos") {
        // ~/Library/Application Support/recyclo
        dirs::data_dir()
            .map(|d| d.join("recyclo"))
            .unwrap_or_else(|| PathBuf::from("./recyclo_data"))
    } else {
        // ~/.local/share/recyclo, %LOCALAPPDATA%\recyclo
        dirs::data_local_dir()
            .map(|d| d.join("recyclo"))
            .unwrap_or_else(|| PathBuf::from("./recyclo_data"))
    }
}

pub fn default_database_path() -> PathBuf {
    default_data_folder().join("recyclo.db")
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    rules: RawRuleTable,
    #[serde(default)]
    tips: BTreeMap<String, Vec<String>>,
}

/// Validated disposal policy: rule table plus tips
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub rules: RuleTable,
    pub tips: TipBook,
}

impl PolicyConfig {
    /// Parse and validate a policy document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PolicyFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse rule file: {}", e)))?;

        Ok(Self {
            rules: RuleTable::from_raw(&file.rules)?,
            tips: TipBook::from_raw(&file.tips)?,
        })
    }

    /// Compiled-in policy
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    /// Load a policy file, or the built-in policy when `path` is `None`
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let policy = match path {
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::Config(format!("Failed to read rule file {:?}: {}", path, e))
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::builtin()?,
        };

        info!(
            "Policy loaded: {} city tables plus default",
            policy.rules.cities().count()
        );
        Ok(policy)
    }
}
