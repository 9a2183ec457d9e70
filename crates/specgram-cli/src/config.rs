//! Configuration file loading for the CLI
//!
//! Finds the TOML configuration file (explicit path, working directory, or
//! platform config directory) and loads it into an [`AppConfig`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use specgram::{SpecgramError, config::AppConfig};

const LOCAL_CONFIG: &str = "specgram/config.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid configuration {path}: {message}")]
    Validation { path: PathBuf, message: String },
}

impl From<ConfigError> for SpecgramError {
    fn from(err: ConfigError) -> Self {
        SpecgramError::Config(err.to_string())
    }
}

/// Find and load configuration.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. `specgram/config.toml` in the working directory
/// 3. Platform-specific config directory
/// 4. Built-in defaults
///
/// # Errors
///
/// Returns an error if an explicit path is given but does not exist, or if
/// a configuration file cannot be read, parsed, or holds invalid values.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, SpecgramError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "specgram", "specgram") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, SpecgramError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.check().map_err(|message| ConfigError::Validation {
        path: path.to_path_buf(),
        message,
    })?;

    Ok(config)
}
