//! Transient config files for frpc
//!
//! frpc always reads a private copy of its configuration so that saved
//! profiles can be edited or deleted while a tunnel is running.

use crate::error::SupervisorError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

const TEMP_PREFIX: &str = "frpc-";
const TEMP_SUFFIX: &str = ".toml";

/// Where the configuration for a run comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Rendered config text
    Text(String),
    /// An existing config file, copied before use
    File(PathBuf),
}

/// A config file that exists only for one supervisor run
///
/// Deleted by [`EphemeralConfig::remove`], or on drop as a backstop.
#[derive(Debug)]
pub struct EphemeralConfig {
    path: TempPath,
}

impl EphemeralConfig {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failures
    pub fn remove(self) -> Result<(), SupervisorError> {
        let path = self.path.to_path_buf();
        self.path
            .close()
            .map_err(|e| SupervisorError::io(&path, e))?;
        debug!("Removed transient config {:?}", path);
        Ok(())
    }
}

/// Produces [`EphemeralConfig`] files
#[derive(Debug, Clone, Default)]
pub struct ConfigMaterializer {
    temp_dir: Option<PathBuf>,
}

impl ConfigMaterializer {
    /// Materialize into the system temp directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize into a specific directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    /// Write `content`, or a copy of `existing_path`, to a new transient file
    ///
    /// Exactly one of the two must be given.
    pub fn materialize(
        &self,
        content: Option<&str>,
        existing_path: Option<&Path>,
    ) -> Result<EphemeralConfig, SupervisorError> {
        let bytes = match (content, existing_path) {
            (Some(text), None) => text.as_bytes().to_vec(),
            (None, Some(path)) => {
                std::fs::read(path).map_err(|e| SupervisorError::io(path, e))?
            }
            (Some(_), Some(_)) => {
                return Err(SupervisorError::InvalidInput {
                    reason: "both config text and config path were given".to_string(),
                })
            }
            (None, None) => {
                return Err(SupervisorError::InvalidInput {
                    reason: "neither config text nor config path was given".to_string(),
                })
            }
        };

        self.write_transient(&bytes)
    }

    pub fn materialize_source(
        &self,
        source: &ConfigSource,
    ) -> Result<EphemeralConfig, SupervisorError> {
        match source {
            ConfigSource::Text(text) => self.materialize(Some(text.as_str()), None),
            ConfigSource::File(path) => self.materialize(None, Some(path.as_path())),
        }
    }

    fn write_transient(&self, bytes: &[u8]) -> Result<EphemeralConfig, SupervisorError> {
        let dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);

        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|e| SupervisorError::io(&dir, e))?;

        let path = file.path().to_path_buf();
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| SupervisorError::io(&path, e))?;

        // Closes the handle; frpc opens the file on its own
        let path = file.into_temp_path();
        debug!("Materialized {} bytes into {:?}", bytes.len(), path);

        Ok(EphemeralConfig { path })
    }
}
