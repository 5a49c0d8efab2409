//! Configuration loading and resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the backend API base URL
pub const ENV_API_BASE_URL: &str = "REEL_API_BASE_URL";
/// Environment variable overriding the image host used for relative image paths
pub const ENV_IMAGE_BASE_URL: &str = "REEL_IMAGE_BASE_URL";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "REEL_LOG_LEVEL";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Typeahead lookup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    /// Keystroke debounce interval in milliseconds
    pub debounce_ms: u64,
    /// Suggestions requested per lookup call
    pub page_size: u32,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            page_size: 10,
        }
    }
}

/// Session restoration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationSettings {
    /// Snapshots at or above this encoded size are not written to the backup store
    pub backup_cap_bytes: usize,
    /// Directory used by the file-backed backup store (CLI only)
    pub backup_dir: Option<PathBuf>,
}

impl Default for RestorationSettings {
    fn default() -> Self {
        Self {
            backup_cap_bytes: 1_000_000,
            backup_dir: None,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Transport timeout per request, in seconds
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 15 }
    }
}

/// TOML configuration file contents
///
/// All fields are optional; absent sections fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub api_base_url: Option<String>,
    pub image_base_url: Option<String>,
    pub logging: LoggingConfig,
    pub lookup: LookupSettings,
    pub restoration: RestorationSettings,
    pub http: HttpSettings,
}

/// Compiled-in defaults (lowest priority tier)
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub api_base_url: String,
    pub image_base_url: String,
    pub log_level: String,
    pub backup_dir: PathBuf,
}

impl CompiledDefaults {
    /// Defaults for the current platform
    pub fn for_current_platform() -> Self {
        let backup_dir = dirs::cache_dir()
            .map(|d| d.join("reel").join("restoration"))
            .unwrap_or_else(|| PathBuf::from("./reel_data/restoration"));

        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w185".to_string(),
            log_level: "info".to_string(),
            backup_dir,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub image_base_url: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base_url: String,
    pub image_base_url: String,
    pub log_level: String,
    pub debounce: Duration,
    pub lookup_page_size: u32,
    pub backup_cap_bytes: usize,
    pub backup_dir: PathBuf,
    pub http_timeout: Duration,
}

/// Resolves configuration for one Reel module
pub struct ConfigResolver {
    module_name: String,
}

impl ConfigResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Platform config file location: `<config_dir>/reel/<module>.toml`
    pub fn default_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reel").join(format!("{}.toml", self.module_name)))
    }

    /// Resolve all settings, tolerating a missing or broken TOML file
    pub fn resolve(&self, overrides: &ConfigOverrides) -> ResolvedConfig {
        let toml_config = self.load_or_default(overrides.config_path.as_deref());
        resolve_with(overrides, &toml_config, &CompiledDefaults::for_current_platform())
    }

    fn load_or_default(&self, explicit: Option<&Path>) -> TomlConfig {
        let path = match explicit.map(Path::to_path_buf).or_else(|| self.default_config_path()) {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using defaults");
                return TomlConfig::default();
            }
        };

        if !path.exists() {
            if explicit.is_some() {
                warn!("Config file not found: {}, using defaults", path.display());
            } else {
                debug!("No config file at {}, using defaults", path.display());
            }
            return TomlConfig::default();
        }

        match load_toml_config(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                TomlConfig::default()
            }
        }
    }
}

/// Apply the CLI → ENV → TOML → default priority to every setting
pub fn resolve_with(
    overrides: &ConfigOverrides,
    toml_config: &TomlConfig,
    defaults: &CompiledDefaults,
) -> ResolvedConfig {
    let api_base_url = pick(
        overrides.api_base_url.as_deref(),
        ENV_API_BASE_URL,
        toml_config.api_base_url.as_deref(),
        &defaults.api_base_url,
    );
    let image_base_url = pick(
        overrides.image_base_url.as_deref(),
        ENV_IMAGE_BASE_URL,
        toml_config.image_base_url.as_deref(),
        &defaults.image_base_url,
    );
    let log_level = pick(
        overrides.log_level.as_deref(),
        ENV_LOG_LEVEL,
        Some(toml_config.logging.level.as_str()),
        &defaults.log_level,
    );

    ResolvedConfig {
        api_base_url: api_base_url.trim_end_matches('/').to_string(),
        image_base_url: image_base_url.trim_end_matches('/').to_string(),
        log_level,
        debounce: Duration::from_millis(toml_config.lookup.debounce_ms),
        lookup_page_size: toml_config.lookup.page_size.max(1),
        backup_cap_bytes: toml_config.restoration.backup_cap_bytes,
        backup_dir: toml_config
            .restoration
            .backup_dir
            .clone()
            .unwrap_or_else(|| defaults.backup_dir.clone()),
        http_timeout: Duration::from_secs(toml_config.http.timeout_secs.max(1)),
    }
}

fn pick(cli: Option<&str>, env_var: &str, toml_value: Option<&str>, default: &str) -> String {
    if let Some(value) = cli.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return value;
        }
    }
    if let Some(value) = toml_value.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    default.to_string()
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
