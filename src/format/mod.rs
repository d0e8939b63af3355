//! Output formatters for a parsed [`Status`]

mod json;
mod openmetrics;

pub use json::JsonFormatter;
pub use openmetrics::{escape_label_value, OpenMetricsFormatter};

use crate::error::Result;
use crate::status::Status;
use std::fmt;

/// Renders a status report into some textual output format
pub trait Formatter {
    fn format(&self, status: &Status) -> Result<String>;
}

/// Output formats selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Openmetrics,
}

impl OutputFormat {
    /// Build the formatter for this format. `indent` only affects JSON.
    pub fn formatter(self, indent: bool) -> Box<dyn Formatter> {
        match self {
            OutputFormat::Json => Box::new(JsonFormatter::new(indent)),
            OutputFormat::Openmetrics => Box::new(OpenMetricsFormatter::new()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Openmetrics => f.write_str("openmetrics"),
        }
    }
}
