//! JSON settings file I/O
//!
//! Handles loading and saving client settings to/from `config.json`
//! in the user's frp configuration directory.

use crate::config::ClientSettings;
use crate::error::{ConfigError, FrpError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default settings file name
const SETTINGS_FILE_NAME: &str = "config.json";

/// Get the frp configuration directory
///
/// Returns ~/.frp, or FRP_CONFIG_DIR environment variable if set
pub fn get_config_dir() -> Result<PathBuf, FrpError> {
    // Allow tests to override config directory via environment variable
    if let Some(config_dir) = std::env::var_os("FRP_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .ok_or_else(|| {
            FrpError::Config(ConfigError::IoError {
                message: "HOME environment variable not set".to_string(),
            })
        })?;

    Ok(PathBuf::from(home).join(".frp"))
}

/// Get the settings file path inside a configuration directory
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE_NAME)
}

/// Create the configuration directory and a default settings file
///
/// An existing settings file is left untouched.
pub fn init_config_dir(config_dir: &Path) -> Result<(), FrpError> {
    std::fs::create_dir_all(config_dir).map_err(|e| {
        FrpError::Config(ConfigError::IoError {
            message: format!("Failed to create config directory: {}", e),
        })
    })?;

    let path = settings_path(config_dir);
    if !path.exists() {
        save_settings_to_path(&ClientSettings::default(), &path)?;
        info!("Created default settings at {:?}", path);
    }

    Ok(())
}

/// Load settings from the default configuration directory
pub fn load_settings() -> Result<ClientSettings, FrpError> {
    let config_dir = get_config_dir()?;
    init_config_dir(&config_dir)?;
    load_settings_from_path(settings_path(&config_dir))
}

/// Load settings from a specific JSON file
pub fn load_settings_from_path<P: AsRef<Path>>(path: P) -> Result<ClientSettings, FrpError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FrpError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => FrpError::Config(ConfigError::IoError {
            message: format!("Failed to read settings file: {}", e),
        }),
    })?;

    let settings: ClientSettings = serde_json::from_str(&contents)?;
    debug!("Loaded settings from {:?}", path.as_ref());

    Ok(settings)
}

/// Save settings to the default configuration directory
pub fn save_settings(settings: &ClientSettings) -> Result<(), FrpError> {
    let config_dir = get_config_dir()?;
    save_settings_to_path(settings, settings_path(&config_dir))
}

/// Save settings to a specific JSON file
pub fn save_settings_to_path<P: AsRef<Path>>(
    settings: &ClientSettings,
    path: P,
) -> Result<(), FrpError> {
    settings
        .validate()
        .map_err(|e| FrpError::Config(ConfigError::ValidationError { message: e }))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            FrpError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let json = serde_json::to_string_pretty(settings)?;

    std::fs::write(&path, json).map_err(|_e| {
        FrpError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    Ok(())
}
