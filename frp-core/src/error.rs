//! Error types for the frp CLI tool
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the frp application
#[derive(Error, Debug)]
pub enum FrpError {
    /// Errors related to settings, templates and saved profiles
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while supervising the frpc process
    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON settings file errors
    #[error("Settings file error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Invalid port: {value}")]
    InvalidPort { value: String },

    #[error("Unsupported proxy protocol: {value}")]
    InvalidProtocol { value: String },

    #[error("Unknown setting: {key}")]
    UnknownKey { key: String },

    #[error("Expected KEY=VALUE, got: {input}")]
    MalformedAssignment { input: String },

    #[error("Invalid profile name: {name}")]
    InvalidProfileName { name: String },

    #[error("Configuration {name} does not exist")]
    ProfileNotFound { name: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Errors raised by the tunnel supervisor core
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Exactly one of config text or config path must be supplied
    #[error("Invalid materialize request: {reason}")]
    InvalidInput { reason: String },

    /// Temp storage unwritable or source config unreadable
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("frpc executable not found: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("Failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Invalid supervisor state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl SupervisorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
