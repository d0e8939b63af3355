//! OpenVPN server configuration reader
//!
//! Only the handful of directives needed to locate and label the status file
//! are read; everything else in the config is ignored.
//!
//! | directive | use |
//! |---|---|
//! | `status <file> [seconds]` | status file path (required), refresh ignored |
//! | `status-version <n>` | layout 1, 2 or 3 (default 3) |
//! | `local <address>` | server metadata |
//! | `port <port>` | server metadata (default `1194`) |
//! | `proto <protocol>` | server metadata |
//! | `dev <device>` | server metadata |

use crate::error::{Result, StatusError};
use crate::status::{ServerInfo, StatusVersion};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_PORT: &str = "1194";

/// Settings extracted from an OpenVPN server config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Status file base name without its final extension
    pub id: String,
    pub local: String,
    pub port: String,
    pub proto: String,
    pub dev: String,
    /// Path to the status file
    pub status_file: PathBuf,
    /// Status file layout
    pub status_version: StatusVersion,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            local: String::new(),
            port: DEFAULT_PORT.to_string(),
            proto: String::new(),
            dev: String::new(),
            status_file: PathBuf::new(),
            status_version: StatusVersion::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an OpenVPN config file.
    ///
    /// A relative status path is resolved against the config file's
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            StatusError::Config(format!(
                "Failed to open config file {}: {e}",
                path.display()
            ))
        })?;
        let contents = String::from_utf8_lossy(&bytes);

        let mut config = <Self as FromStr>::from_str(&contents)?;
        if config.status_file.is_relative() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.status_file = dir.join(&config.status_file);
            }
        }
        Ok(config)
    }

    /// Server metadata to attach to a parsed status
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            id: self.id.clone(),
            local: self.local.clone(),
            port: self.port.clone(),
            proto: self.proto.clone(),
            dev: self.dev.clone(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.status_file.as_os_str().is_empty() {
            return Err(StatusError::Config(
                "no 'status' directive found in config file".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&mut self, directive: &str, value: &str) {
        match directive {
            "local" => self.local = value.to_string(),
            "port" => self.port = value.to_string(),
            "proto" => self.proto = value.to_string(),
            "dev" => self.dev = value.to_string(),
            "status" => {
                self.status_file = PathBuf::from(value);
                self.id = server_id(value);
            }
            "status-version" => self.status_version = StatusVersion::from_directive(value),
            _ => {}
        }
    }
}

impl FromStr for ServerConfig {
    type Err = StatusError;

    fn from_str(content: &str) -> Result<Self> {
        let mut config = ServerConfig::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            // directives without a value are ignored
            if let (Some(directive), Some(value)) = (tokens.next(), tokens.next()) {
                config.apply(directive, value);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Status file base name with its final extension removed.
///
/// `/var/log/openvpn/file.txt.log` becomes `file.txt`.
pub fn server_id(status_path: &str) -> String {
    Path::new(status_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
