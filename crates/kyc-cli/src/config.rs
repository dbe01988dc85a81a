//! CLI configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use kyc_session::SessionConfig;

/// Directory under the home directory holding config and session files.
const APP_DIR: &str = ".kyc-console";

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// API base URL (e.g., http://localhost:8080/api).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Directory holding the session slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_dir: Option<PathBuf>,

    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Routes and public endpoints.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            session_dir: None,
            output_format: OutputFormat::default(),
            timeout_secs: default_timeout_secs(),
            session: SessionConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from the default file.
    pub fn load() -> crate::CliResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> crate::CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::CliError::Config(format!("failed to parse config: {e}")))?;
        config.session.validate()?;
        Ok(config)
    }

    /// Saves configuration to the default file.
    pub fn save(&self) -> crate::CliResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Saves configuration to `path`.
    pub fn save_to(&self, path: &Path) -> crate::CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::CliError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Gets the configuration file path.
    pub fn config_path() -> crate::CliResult<PathBuf> {
        Ok(app_dir()?.join("config.toml"))
    }

    /// Gets the effective API URL (from args or config).
    pub fn effective_api_url(&self, arg: Option<&str>) -> String {
        arg.map_or_else(|| self.api_url.clone(), str::to_string)
            .trim_end_matches('/')
            .to_string()
    }

    /// Gets the effective session directory (from args, config, or the
    /// default under the home directory).
    pub fn effective_session_dir(&self, arg: Option<&Path>) -> crate::CliResult<PathBuf> {
        match arg.map(Path::to_path_buf).or_else(|| self.session_dir.clone()) {
            Some(dir) => Ok(dir),
            None => Ok(app_dir()?.join("session")),
        }
    }

    /// Request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn app_dir() -> crate::CliResult<PathBuf> {
    let home = dirs_next::home_dir()
        .ok_or_else(|| crate::CliError::Config("could not determine home directory".to_string()))?;
    Ok(home.join(APP_DIR))
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// YAML-like format.
    Yaml,
    /// Quiet (minimal output).
    Quiet,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            "quiet" => Ok(Self::Quiet),
            _ => Err(crate::CliError::InvalidArgument(format!(
                "Unknown output format: {s}. Supported: table, json, yaml, quiet"
            ))),
        }
    }
}
