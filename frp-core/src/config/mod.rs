//! Configuration module
//!
//! Client settings (server address, port, auth token) persisted as JSON,
//! frpc client config rendering, and saved proxy profiles.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod profiles;
pub mod settings;
pub mod template;

pub use template::{ClientConfig, PortMapping, ProxyEntry, ProxyProtocol};

/// Placeholder shown instead of the real token
pub const MASKED_TOKEN: &str = "******";

/// Environment variable naming the frpc executable
pub const FRPC_ENV: &str = "FRP_FRPC";

/// frps connection settings shared by every tunnel
///
/// Stored in `config.json` under the frp config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// frps server hostname or IP address
    pub server_addr: String,

    /// frps server port (default: 7000)
    pub server_port: u16,

    /// Auth token shared with the server
    pub token: String,

    /// Explicit path to the frpc executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frpc_path: Option<PathBuf>,
}

impl ClientSettings {
    /// Create settings for a server
    pub fn new(server_addr: String, server_port: u16, token: String) -> Self {
        Self {
            server_addr,
            server_port,
            token,
            frpc_path: None,
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server_addr.is_empty() {
            return Err("Server address cannot be empty".to_string());
        }

        if self.server_addr.chars().any(char::is_whitespace) {
            return Err("Server address contains whitespace".to_string());
        }

        if self.server_port == 0 {
            return Err("Server port cannot be zero".to_string());
        }

        if self.token.is_empty() {
            return Err("Token cannot be empty".to_string());
        }

        Ok(())
    }

    /// Copy of the settings that is safe to print
    pub fn masked(&self) -> Self {
        Self {
            token: MASKED_TOKEN.to_string(),
            ..self.clone()
        }
    }

    /// Pick the frpc executable to run
    ///
    /// Precedence: `explicit`, then `FRP_FRPC`, then the `frpc_path` setting,
    /// then `frpinit/frpc` next to the running binary.
    pub fn frpc_executable(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        if let Some(path) = std::env::var_os(FRPC_ENV).filter(|value| !value.is_empty()) {
            return PathBuf::from(path);
        }

        match &self.frpc_path {
            Some(path) => path.clone(),
            None => default_frpc_path(),
        }
    }

    /// Apply a `KEY=VALUE` assignment from the command line
    ///
    /// `server` takes `ADDR:PORT` and updates both fields.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "server" => {
                let (addr, port) =
                    value
                        .rsplit_once(':')
                        .ok_or_else(|| ConfigError::MalformedAssignment {
                            input: format!("{}={}", key, value),
                        })?;
                self.server_port = parse_port(port)?;
                self.server_addr = addr.to_string();
            }
            "server_addr" => self.server_addr = value.to_string(),
            "server_port" => self.server_port = parse_port(value)?,
            "token" => self.token = value.to_string(),
            "frpc_path" => self.frpc_path = Some(PathBuf::from(value)),
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                })
            }
        }

        self.validate()
            .map_err(|message| ConfigError::ValidationError { message })
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1".to_string(),
            server_port: 7000,
            token: "your_token".to_string(),
            frpc_path: None,
        }
    }
}

/// `frpinit/frpc` beside the current executable
pub fn default_frpc_path() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("frpinit")
        .join(format!("frpc{}", std::env::consts::EXE_SUFFIX))
}

/// Split a `KEY=VALUE` argument
pub fn parse_assignment(input: &str) -> Result<(&str, &str), ConfigError> {
    input
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| ConfigError::MalformedAssignment {
            input: input.to_string(),
        })
}

pub(crate) fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort {
            value: value.to_string(),
        })
}
