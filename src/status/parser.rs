//! Status file scan
//!
//! The scan never stops on a bad line. Decoder failures are collected into
//! [`ParseOutcome::errors`] next to the partially filled [`Status`], and a
//! read failure mid-stream ends the scan with one final error.

use super::dispatch::dispatch_line;
use super::{Status, StatusVersion};
use crate::error::{Result, StatusError};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Model plus every recoverable error met while building it
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub status: Status,
    pub errors: Vec<StatusError>,
}

impl ParseOutcome {
    /// True when every line decoded cleanly
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Status, Vec<StatusError>) {
        (self.status, self.errors)
    }
}

/// Parse a status file written in the given layout.
///
/// # Errors
/// Returns [`StatusError::Open`] when the file cannot be opened. Every other
/// failure is reported inside the returned [`ParseOutcome`].
pub fn parse_file<P: AsRef<Path>>(path: P, version: StatusVersion) -> Result<ParseOutcome> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StatusError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Parsing {} as status version {version}", path.display());
    let outcome = parse_reader(BufReader::new(file), version);
    log::debug!(
        "Parsed {}: {} clients, {} routes, {} errors",
        path.display(),
        outcome.status.client_list.len(),
        outcome.status.routing_table.len(),
        outcome.errors.len()
    );
    Ok(outcome)
}

/// Parse status text held in memory
pub fn parse_str(text: &str, version: StatusVersion) -> ParseOutcome {
    parse_reader(Cursor::new(text.as_bytes()), version)
}

/// Scan any buffered reader line by line.
///
/// Lines are decoded lossily, so stray non-UTF-8 bytes only affect the
/// field they appear in.
pub fn parse_reader<R: BufRead>(reader: R, version: StatusVersion) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut line_number = 0;

    for raw in reader.split(b'\n') {
        let raw = match raw {
            Ok(raw) => raw,
            Err(source) => {
                outcome.errors.push(StatusError::Read {
                    line: line_number,
                    source,
                });
                break;
            }
        };
        line_number += 1;

        let text = String::from_utf8_lossy(&raw);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }

        if let Err(err) = dispatch_line(line, &mut outcome.status, line_number, version) {
            log::debug!("{err}");
            outcome.errors.push(err.into());
        }
    }

    outcome
}
