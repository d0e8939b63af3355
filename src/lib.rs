//! ovpn-status - OpenVPN status file parser
//!
//! Reads the status report OpenVPN writes with the `status` directive, in any
//! of the three `status-version` layouts, and re-exposes it as JSON or as an
//! OpenMetrics exposition.
//!
//! ## What This Crate Provides
//! - A tolerant line-oriented status parser that keeps going past bad lines
//!   and reports every problem next to the decoded model
//! - A reader for the OpenVPN server config directives that locate and label
//!   the status file
//! - JSON and OpenMetrics formatters behind one [`Formatter`] trait
//!
//! ## Example
//! ```no_run
//! use ovpn_status::{Formatter, JsonFormatter, ServerConfig};
//!
//! # fn main() -> ovpn_status::Result<()> {
//! let config = ServerConfig::from_file("/etc/openvpn/server.conf")?;
//! let outcome = ovpn_status::parse_file(&config.status_file, config.status_version)?;
//! for err in &outcome.errors {
//!     eprintln!("{err}");
//! }
//! let status = outcome.status.with_server(config.server_info());
//! println!("{}", JsonFormatter::new(true).format(&status)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod status;

pub use config::ServerConfig;
pub use error::{FieldError, ParseError, Result, StatusError};
pub use format::{Formatter, JsonFormatter, OpenMetricsFormatter, OutputFormat};
pub use status::{
    parse_file, parse_reader, parse_str, Client, ParseOutcome, Route, ServerInfo, Status,
    StatusVersion,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
