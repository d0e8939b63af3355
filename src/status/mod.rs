//! OpenVPN status file model and parser
//!
//! OpenVPN writes its status report in one of three layouts selected by the
//! `status-version` directive:
//!
//! - version 1: comma separated, one untagged client per line
//! - version 2: comma separated, every line starts with a type tag
//!   (`TITLE`, `TIME`, `HEADER`, `CLIENT_LIST`, `ROUTING_TABLE`, ...)
//! - version 3: same as version 2 but tab separated
//!
//! All three decode into the same [`Status`] model.

mod decode;
mod dispatch;
mod parser;

pub use parser::{parse_file, parse_reader, parse_str, ParseOutcome};

use crate::error::{Result, StatusError};
use serde::Serialize;
use std::fmt;

/// Status file layout version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub enum StatusVersion {
    V1,
    V2,
    #[default]
    V3,
}

impl StatusVersion {
    /// Field delimiter used by this layout
    pub fn delimiter(self) -> char {
        match self {
            StatusVersion::V1 | StatusVersion::V2 => ',',
            StatusVersion::V3 => '\t',
        }
    }

    /// Whether lines carry a leading type tag
    pub fn is_tagged(self) -> bool {
        !matches!(self, StatusVersion::V1)
    }

    /// Numeric version as written in the `status-version` directive
    pub fn as_number(self) -> u8 {
        match self {
            StatusVersion::V1 => 1,
            StatusVersion::V2 => 2,
            StatusVersion::V3 => 3,
        }
    }

    /// Interpret a `status-version` directive value.
    ///
    /// Anything that is not 1, 2 or 3 falls back to the default (3).
    pub fn from_directive(value: &str) -> Self {
        value
            .parse::<u8>()
            .ok()
            .and_then(|n| StatusVersion::try_from(n).ok())
            .unwrap_or_else(|| {
                log::debug!("Unsupported status-version {value:?}, using 3");
                StatusVersion::default()
            })
    }
}

impl TryFrom<u8> for StatusVersion {
    type Error = StatusError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(StatusVersion::V1),
            2 => Ok(StatusVersion::V2),
            3 => Ok(StatusVersion::V3),
            _ => Err(StatusError::Config(format!(
                "status-version must be 1, 2 or 3, got {value}"
            ))),
        }
    }
}

impl From<StatusVersion> for u8 {
    fn from(version: StatusVersion) -> Self {
        version.as_number()
    }
}

impl fmt::Display for StatusVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_number())
    }
}

/// Server metadata taken from the OpenVPN server config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Status file base name without its final extension
    pub id: String,
    /// `--local`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub local: String,
    /// `--port`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    /// `--proto`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proto: String,
    /// `--dev`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dev: String,
}

/// Complete decoded status report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Attached by the caller after parsing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerInfo>,
    /// Server description (v2/v3 only)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Human-readable time followed by epoch seconds (v2/v3 only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub time: Vec<String>,
    pub client_list: Vec<Client>,
    /// Virtual address to client mappings (v2/v3 only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routing_table: Vec<Route>,
}

impl Status {
    /// Attach server metadata, replacing any previous value
    pub fn with_server(mut self, server: ServerInfo) -> Self {
        self.server = Some(server);
        self
    }

    /// Timestamp of the report as written by OpenVPN, if present
    pub fn updated_at(&self) -> Option<&str> {
        self.time.first().map(String::as_str)
    }
}

/// One connected peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Certificate common name
    pub common_name: String,
    /// Remote address with the port stripped
    pub real_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_address: Option<String>,
    #[serde(rename = "virtualIPv6Address", skip_serializing_if = "Option::is_none")]
    pub virtual_ipv6_address: Option<String>,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub connected_since: String,
    /// Epoch seconds, 0 when the layout does not carry it
    #[serde(skip_serializing_if = "is_zero")]
    pub connected_since_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Left out of the JSON document when absent or 0
    #[serde(skip_serializing_if = "is_unset")]
    pub client_id: Option<u64>,
    /// Left out of the JSON document when absent or 0
    #[serde(skip_serializing_if = "is_unset")]
    pub peer_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_cipher: Option<String>,
}

/// One routing table entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub virtual_address: String,
    pub common_name: String,
    /// Remote address with the port stripped
    pub real_address: String,
    pub last_ref: String,
    pub last_ref_time: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_unset(value: &Option<u64>) -> bool {
    value.unwrap_or(0) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_delimiters() {
        assert_eq!(StatusVersion::V1.delimiter(), ',');
        assert_eq!(StatusVersion::V2.delimiter(), ',');
        assert_eq!(StatusVersion::V3.delimiter(), '\t');
        assert!(!StatusVersion::V1.is_tagged());
        assert!(StatusVersion::V3.is_tagged());
    }

    #[test]
    fn test_version_from_directive() {
        assert_eq!(StatusVersion::from_directive("1"), StatusVersion::V1);
        assert_eq!(StatusVersion::from_directive("2"), StatusVersion::V2);
        assert_eq!(StatusVersion::from_directive("3"), StatusVersion::V3);
        assert_eq!(StatusVersion::from_directive("9"), StatusVersion::V3);
        assert_eq!(StatusVersion::from_directive("0"), StatusVersion::V3);
        assert_eq!(StatusVersion::from_directive("two"), StatusVersion::V3);
        assert_eq!(StatusVersion::from_directive("-1"), StatusVersion::V3);
    }

    #[test]
    fn test_version_try_from() {
        assert_eq!(StatusVersion::try_from(2).unwrap(), StatusVersion::V2);
        assert!(StatusVersion::try_from(4).is_err());
        assert_eq!(StatusVersion::V2.to_string(), "2");
    }

    #[test]
    fn test_updated_at() {
        let mut status = Status::default();
        assert_eq!(status.updated_at(), None);
        status.time = vec!["Thu Nov 27 10:30:45 2025".into(), "1732704645".into()];
        assert_eq!(status.updated_at(), Some("Thu Nov 27 10:30:45 2025"));
    }
}
