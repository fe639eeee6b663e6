//! frpc client configuration rendering
//!
//! Builds the TOML document handed to frpc. The supervisor treats the
//! rendered text as opaque bytes.

use crate::config::{parse_port, ClientSettings};
use crate::error::{ConfigError, FrpError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain frpc requires for http/https proxies when none is configured
pub const DEFAULT_CUSTOM_DOMAIN: &str = "example.com";

/// Proxy protocol understood by frpc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    #[default]
    Tcp,
    Udp,
    Http,
    Https,
}

impl ProxyProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Tcp => "tcp",
            ProxyProtocol::Udp => "udp",
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
        }
    }

    /// http and https proxies are routed by domain
    pub fn is_web(&self) -> bool {
        matches!(self, ProxyProtocol::Http | ProxyProtocol::Https)
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(ProxyProtocol::Tcp),
            "udp" => Ok(ProxyProtocol::Udp),
            "http" => Ok(ProxyProtocol::Http),
            "https" => Ok(ProxyProtocol::Https),
            _ => Err(ConfigError::InvalidProtocol {
                value: s.to_string(),
            }),
        }
    }
}

/// `LOCAL[:REMOTE]` port pair from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub local: u16,
    pub remote: Option<u16>,
}

impl FromStr for PortMapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((local, remote)) => Ok(Self {
                local: parse_port(local)?,
                remote: Some(parse_port(remote)?),
            }),
            None => Ok(Self {
                local: parse_port(s)?,
                remote: None,
            }),
        }
    }
}

/// One `[[proxies]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub protocol: ProxyProtocol,

    pub local_port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_domains: Vec<String>,
}

impl ProxyEntry {
    /// Build a named proxy entry
    ///
    /// A remote port of 0 means "let the server pick" and is left out.
    pub fn new(name: impl Into<String>, protocol: ProxyProtocol, mapping: PortMapping) -> Self {
        let custom_domains = if protocol.is_web() {
            vec![DEFAULT_CUSTOM_DOMAIN.to_string()]
        } else {
            Vec::new()
        };

        Self {
            name: name.into(),
            protocol,
            local_port: mapping.local,
            remote_port: mapping.remote.filter(|port| *port != 0),
            custom_domains,
        }
    }

    /// Entry for a one-off tunnel started straight from the command line
    pub fn ad_hoc(protocol: ProxyProtocol, mapping: PortMapping) -> Self {
        let remote = match mapping.remote.filter(|port| *port != 0) {
            Some(port) => port.to_string(),
            None => "auto".to_string(),
        };
        Self::new(
            format!("temp_{}_{}", mapping.local, remote),
            protocol,
            mapping,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSection {
    pub token: String,
}

/// Complete frpc client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub server_addr: String,
    pub server_port: u16,
    pub auth: AuthSection,
    pub proxies: Vec<ProxyEntry>,
}

impl ClientConfig {
    /// Create a configuration with a single proxy
    pub fn new(settings: &ClientSettings, proxy: ProxyEntry) -> Self {
        Self {
            server_addr: settings.server_addr.clone(),
            server_port: settings.server_port,
            auth: AuthSection {
                token: settings.token.clone(),
            },
            proxies: vec![proxy],
        }
    }

    /// Render the TOML text frpc reads
    pub fn render(&self) -> Result<String, FrpError> {
        Ok(toml::to_string(self)?)
    }
}
