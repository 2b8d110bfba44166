//! Application settings loading from config.toml
//!
//! Every key has a default, so a missing file or a file with only some sections
//! yields a usable configuration. Secrets (the bot token, the database URL) are
//! not stored here; they come from the environment.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// School identity shown in replies
    pub school: SchoolConfig,
    /// Defaults applied when enrolling students
    pub billing: BillingConfig,
    /// Location and behavior of the legacy CSV data files
    pub legacy: LegacyConfig,
}

/// School identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchoolConfig {
    /// Display name
    pub name: String,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            name: "Tertúlia Libras".to_string(),
        }
    }
}

/// Billing defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Due day used when an enrollment does not name one
    pub default_due_day: u32,
    /// Installment count used when an enrollment does not name one
    pub default_installments: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_due_day: 10,
            default_installments: 12,
        }
    }
}

/// Legacy CSV settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// Directory holding `students.csv`, `payments.csv` and `internships.csv`
    pub data_dir: PathBuf,
    /// Import the CSV files into the database at startup
    pub import_on_startup: bool,
    /// Directory `/export` writes its CSV files to
    pub export_dir: PathBuf,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            import_on_startup: false,
            export_dir: PathBuf::from("exports"),
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: defaults are used instead.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!("Loaded configuration from {path}");
        Ok(config)
    } else {
        info!("No configuration file at {path}, using defaults");
        Ok(AppConfig::default())
    }
}
