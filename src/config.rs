//! # Configuration Management
//!
//! Centralized configuration for the transport library.
//!
//! This module provides structured configuration for servers and clients,
//! plus the protocol-level constants shared by both roles.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - TOML strings via `from_toml()`
//! - Direct instantiation with defaults

use crate::error::{Result, TransportError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// First id handed out to an accepted-and-approved connection.
/// Ids grow monotonically from here; a denied connection consumes none.
pub const FIRST_CLIENT_ID: u32 = 10_000;

/// Default port used by both roles when none is configured
pub const DEFAULT_PORT: u16 = 36_676;

/// Top-level configuration covering both endpoint roles
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetConfig {
    /// Server-specific configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Client-specific configuration
    #[serde(default)]
    pub client: ClientConfig,
}

impl NetConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TransportError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| TransportError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Validate the configuration for common misconfigurations.
    ///
    /// Returns a list of validation errors. Empty list means the
    /// configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.client.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TransportError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Server-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port. Port 0 binds an ephemeral port, reported by
    /// `Server::local_addr` once started.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.address.is_empty() {
            errors.push("server.address must not be empty".to_string());
        }
        errors
    }
}

/// Client-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Hostname or address of the server to connect to
    pub host: String,

    /// Port of the server to connect to
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ClientConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.host.is_empty() {
            errors.push("client.host must not be empty".to_string());
        }
        if self.port == 0 {
            errors.push("client.port must not be 0".to_string());
        }
        errors
    }
}
