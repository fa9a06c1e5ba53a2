//! Configuration loading and resolution
//!
//! Resolution order for the config file:
//! 1. Command-line argument (highest priority)
//! 2. `TRACKMOOD_CONFIG` environment variable
//! 3. `<user config dir>/trackmood/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file is never fatal: the defaults are used and a warning is logged.
//! Environment overrides (`TRACKMOOD_DOWNLOADER`, `TRACKMOOD_WORK_DIR`) are
//! applied after the file is loaded.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TRACKMOOD_CONFIG";
/// Environment variable overriding the downloader program
pub const DOWNLOADER_ENV_VAR: &str = "TRACKMOOD_DOWNLOADER";
/// Environment variable overriding the scratch directory
pub const WORK_DIR_ENV_VAR: &str = "TRACKMOOD_WORK_DIR";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub downloader: DownloaderConfig,
    pub analysis: AnalysisConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[downloader]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Program invoked to search for and download a clip
    pub program: String,
    /// Audio codec/extension requested from the downloader
    pub audio_format: String,
    /// Upper bound on a single download, in seconds (none = wait forever)
    pub timeout_secs: Option<u64>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            timeout_secs: None,
        }
    }
}

/// `[analysis]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rate decoded audio is resampled to before analysis
    pub sample_rate: u32,
    /// Directory for temporary downloads (system temp dir when unset)
    pub work_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            work_dir: None,
        }
    }
}

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.downloader.program.trim().is_empty() {
            return Err(Error::Config("downloader.program must not be empty".to_string()));
        }
        if self.downloader.audio_format.trim().is_empty() {
            return Err(Error::Config(
                "downloader.audio_format must not be empty".to_string(),
            ));
        }
        if self.downloader.timeout_secs == Some(0) {
            return Err(Error::Config(
                "downloader.timeout_secs must be positive".to_string(),
            ));
        }
        if self.analysis.sample_rate == 0 {
            return Err(Error::Config("analysis.sample_rate must be positive".to_string()));
        }
        Ok(())
    }

    /// Apply `TRACKMOOD_DOWNLOADER` / `TRACKMOOD_WORK_DIR` overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(program) = std::env::var(DOWNLOADER_ENV_VAR) {
            if !program.trim().is_empty() {
                debug!(program = %program, "Downloader overridden by environment");
                self.downloader.program = program;
            }
        }
        if let Ok(dir) = std::env::var(WORK_DIR_ENV_VAR) {
            if !dir.trim().is_empty() {
                self.analysis.work_dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// Scratch directory for downloads
    pub fn work_dir(&self) -> PathBuf {
        self.analysis
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Locates and loads the configuration file
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Path of the config file that should be read, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|p| p.exists())
    }

    /// Load, validate and apply environment overrides
    ///
    /// An explicitly named file (CLI or environment) must exist and parse.
    /// When only the default location applies and nothing is there, the
    /// compiled defaults are used.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let explicit = self.cli_path.is_some()
            || std::env::var(CONFIG_ENV_VAR)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);

        let mut config = match self.config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading configuration");
                TomlConfig::load(&path)?
            }
            Some(path) if explicit => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            _ => {
                warn!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// `<user config dir>/trackmood/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trackmood").join("config.toml"))
}
