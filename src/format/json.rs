use super::Formatter;
use crate::error::Result;
use crate::status::Status;

/// JSON document with camelCase keys; empty optional fields are omitted
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    /// Pretty-print with two-space indentation
    pub indent: bool,
}

impl JsonFormatter {
    pub fn new(indent: bool) -> Self {
        Self { indent }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, status: &Status) -> Result<String> {
        let output = if self.indent {
            serde_json::to_string_pretty(status)?
        } else {
            serde_json::to_string(status)?
        };
        Ok(output)
    }
}
