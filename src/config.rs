//! Configuration management for SustainLens.
//!
//! Settings come from (lowest to highest priority) built-in defaults, a config
//! file (found with `prefer` or given with `--config`), `SUSTAINLENS_*`
//! environment variables and CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::dashboard::StalePolicy;

/// Default classification service base URL.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

/// Characters of extracted text shown before the ellipsis.
pub const DEFAULT_EXCERPT_CHARS: usize = 300;

/// Config file name inside the platform config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

pub const USER_AGENT: &str = concat!("SustainLens/", env!("CARGO_PKG_VERSION"));

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid endpoint URL '{0}': {1}")]
    InvalidEndpoint(String, url::ParseError),
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the classification service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Characters of extracted text shown in the result summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt_chars: Option<usize>,
    /// What to do with responses from superseded submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_policy: Option<StalePolicy>,
    /// Refuse to submit when neither a URL nor a file is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_input: Option<bool>,
    /// Log file for the interactive dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Suggested location for a new config file, e.g.
    /// `~/.config/sustainlens/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sustainlens").join(CONFIG_FILENAME))
    }

    /// Discover and load the config file with `prefer`.
    ///
    /// No discovered file means defaults. A discovered file that fails to
    /// parse is an error.
    pub async fn load() -> Result<Self, ConfigError> {
        let source = match prefer::load("sustainlens").await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                None
            }
        };
        match source {
            Some(path) => {
                tracing::debug!("Using config file: {}", path.display());
                Self::load_from_path(&path).await
            }
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    /// `.json` files are parsed as JSON, everything else as TOML.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let mut config: Config = match ext {
            "json" => serde_json::from_str(&contents).map_err(|source| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?,
            _ => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
        };
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply `SUSTAINLENS_*` environment variable overrides.
    ///
    /// Supported env vars:
    /// - `SUSTAINLENS_ENDPOINT`: service base URL
    /// - `SUSTAINLENS_TIMEOUT`: request timeout in seconds
    /// - `SUSTAINLENS_USER_AGENT`: user agent string
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("SUSTAINLENS_ENDPOINT").filter(|s| !s.is_empty()) {
            self.endpoint = Some(val);
        }
        if let Some(val) = lookup("SUSTAINLENS_TIMEOUT") {
            match val.parse() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => tracing::warn!("Ignoring invalid SUSTAINLENS_TIMEOUT: {}", val),
            }
        }
        if let Some(val) = lookup("SUSTAINLENS_USER_AGENT").filter(|s| !s.is_empty()) {
            self.user_agent = Some(val);
        }
        self
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(
        &self,
        settings: &mut Settings,
        base_dir: &Path,
    ) -> Result<(), ConfigError> {
        if let Some(ref endpoint) = self.endpoint {
            settings.endpoint = parse_endpoint(endpoint)?;
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(chars) = self.excerpt_chars {
            settings.excerpt_chars = chars;
        }
        if let Some(policy) = self.stale_policy {
            settings.stale_policy = policy;
        }
        if let Some(require) = self.require_input {
            settings.require_input = require;
        }
        if let Some(ref log_file) = self.log_file {
            settings.log_file = Some(self.resolve_path(log_file, base_dir));
        }
        Ok(())
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: Url,
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    pub excerpt_chars: usize,
    pub stale_policy: StalePolicy,
    pub require_input: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            request_timeout: None,
            user_agent: USER_AGENT.to_string(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            stale_policy: StalePolicy::default(),
            require_input: false,
            log_file: None,
        }
    }
}

impl Settings {
    /// Render the effective settings back into a config file.
    pub fn to_config(&self) -> Config {
        Config {
            endpoint: Some(self.endpoint.to_string()),
            request_timeout_secs: Some(self.request_timeout.map(|d| d.as_secs()).unwrap_or(0)),
            user_agent: Some(self.user_agent.clone()),
            excerpt_chars: Some(self.excerpt_chars),
            stale_policy: Some(self.stale_policy),
            require_input: Some(self.require_input),
            log_file: self.log_file.as_ref().map(|p| p.display().to_string()),
            source_path: None,
        }
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint(raw.to_string(), e))
}

/// Options controlling how settings are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (--config flag).
    pub config_path: Option<PathBuf>,
    /// Endpoint override (--endpoint flag).
    pub endpoint: Option<String>,
    /// Log file override (--log-file flag).
    pub log_file: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        // Priority 1: Explicit --config flag, which must exist
        Some(ref path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.clone()));
            }
            Config::load_from_path(path).await?
        }
        // Priority 2: Whatever prefer discovers, else defaults
        None => Config::load().await?,
    };
    resolve_settings(config.with_env_overrides(), options)
}

/// Layer CLI flags over an already env-adjusted config and resolve it.
fn resolve_settings(
    mut config: Config,
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    if let Some(endpoint) = options.endpoint {
        config.endpoint = Some(endpoint);
    }

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;

    if let Some(log_file) = options.log_file {
        settings.log_file = Some(log_file);
    }

    Ok((settings, config))
}
