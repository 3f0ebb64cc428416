//! Configuration loading for the chat client
//!
//! The broker endpoint lives in a small JSON file (`endpoint.json` by
//! convention) with a camelCase `endpointAddress` field. Credential material
//! (CA root, client certificate, private key) is referenced by path so
//! nothing is hardcoded; relative paths resolve against the config file's
//! directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broker port for TLS-secured MQTT
fn default_port() -> u16 {
    8883
}

fn default_root_ca_path() -> PathBuf {
    PathBuf::from("root-CA.crt")
}

fn default_certificate_path() -> PathBuf {
    PathBuf::from("certificate.pem.crt")
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("private.pem.key")
}

/// Chat client configuration, deserialized from the endpoint JSON file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    /// Broker hostname
    #[serde(rename = "endpointAddress")]
    pub endpoint_address: String,

    /// Broker port (default: 8883)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the trusted root certificate (PEM)
    #[serde(rename = "rootCaPath", default = "default_root_ca_path")]
    pub root_ca_path: PathBuf,

    /// Path to the client certificate (PEM)
    #[serde(rename = "certificatePath", default = "default_certificate_path")]
    pub certificate_path: PathBuf,

    /// Path to the client private key (PEM)
    #[serde(rename = "privateKeyPath", default = "default_private_key_path")]
    pub private_key_path: PathBuf,
}

/// Certificate material loaded into memory once at startup
#[derive(Clone)]
pub struct Credentials {
    /// Trusted root certificate (PEM bytes)
    pub root_ca: Vec<u8>,
    /// Client certificate (PEM bytes)
    pub certificate: Vec<u8>,
    /// Client private key (PEM bytes)
    pub private_key: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never end up in logs
        f.debug_struct("Credentials")
            .field("root_ca", &format!("<{} bytes>", self.root_ca.len()))
            .field("certificate", &format!("<{} bytes>", self.certificate.len()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Failed to read credential file {path}: {source}")]
    CredentialRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid device ID format: {0}")]
    InvalidDeviceId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChatConfig {
    /// Load configuration from a JSON file.
    ///
    /// Relative credential paths are rebased onto the config file's
    /// directory so the client can run from anywhere.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ChatConfig = serde_json::from_str(&content)?;

        if config.endpoint_address.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "endpointAddress must not be empty".to_string(),
            ));
        }

        if let Some(base) = path.parent() {
            config.rebase_credential_paths(base);
        }

        Ok(config)
    }

    /// Rebase relative credential paths onto `base`.
    fn rebase_credential_paths(&mut self, base: &Path) {
        for path in [
            &mut self.root_ca_path,
            &mut self.certificate_path,
            &mut self.private_key_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Read all three credential files into memory.
    pub fn load_credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            root_ca: read_credential_file(&self.root_ca_path)?,
            certificate: read_credential_file(&self.certificate_path)?,
            private_key: read_credential_file(&self.private_key_path)?,
        })
    }
}

fn read_credential_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::CredentialRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate device ID format: non-empty, `[a-zA-Z0-9._-]+`.
///
/// MQTT client IDs are derived from the device ID, so the charset is kept
/// conservative.
pub fn validate_device_id(device_id: &str) -> Result<(), ConfigError> {
    let valid_chars = device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if device_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidDeviceId(format!(
            "Device ID '{device_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
