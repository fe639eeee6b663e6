//! Saved proxy profiles
//!
//! Each profile is a complete frpc client config stored as
//! `<config dir>/configs/<name>.toml`.

use crate::config::{ClientConfig, ClientSettings, ProxyEntry};
use crate::error::{ConfigError, FrpError};
use std::path::{Path, PathBuf};
use tracing::info;

const PROFILES_DIR_NAME: &str = "configs";
const PROFILE_EXTENSION: &str = "toml";

/// Directory holding saved profiles
pub fn profiles_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(PROFILES_DIR_NAME)
}

/// Profile names become file names, so keep them to a safe alphabet
pub fn validate_profile_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidProfileName {
            name: name.to_string(),
        })
    }
}

/// Render and store a profile, returning the written path
///
/// The proxy entry takes the profile name.
pub fn save_profile(
    config_dir: &Path,
    name: &str,
    settings: &ClientSettings,
    mut proxy: ProxyEntry,
) -> Result<PathBuf, FrpError> {
    validate_profile_name(name)?;

    let dir = profiles_dir(config_dir);
    std::fs::create_dir_all(&dir).map_err(|e| {
        FrpError::Config(ConfigError::IoError {
            message: format!("Failed to create profiles directory: {}", e),
        })
    })?;

    proxy.name = name.to_string();
    let text = ClientConfig::new(settings, proxy).render()?;

    let path = dir.join(format!("{}.{}", name, PROFILE_EXTENSION));
    std::fs::write(&path, text).map_err(|_e| {
        FrpError::Config(ConfigError::SaveFailed {
            path: path.to_string_lossy().to_string(),
        })
    })?;

    info!("Saved profile {} to {:?}", name, path);
    Ok(path)
}

/// Path of an existing profile
pub fn profile_path(config_dir: &Path, name: &str) -> Result<PathBuf, ConfigError> {
    validate_profile_name(name).map_err(|_| ConfigError::ProfileNotFound {
        name: name.to_string(),
    })?;

    let path = profiles_dir(config_dir).join(format!("{}.{}", name, PROFILE_EXTENSION));
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::ProfileNotFound {
            name: name.to_string(),
        })
    }
}

/// Names of all saved profiles, sorted
pub fn list_profiles(config_dir: &Path) -> Result<Vec<String>, FrpError> {
    let dir = profiles_dir(config_dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }

    names.sort();
    Ok(names)
}
