//! Record decoders
//!
//! Each decoder takes one line already split on the layout's delimiter and
//! appends at most one record to the [`Status`]. A line below the record's
//! field floor is rejected whole. Numeric sub-fields that fail to parse are
//! zero-filled and reported; the record is still appended.

use super::{Client, Route, Status};
use crate::error::{FieldError, ParseError};
use std::num::ParseIntError;
use std::str::FromStr;

pub(crate) type DecodeResult = std::result::Result<(), ParseError>;

/// Signature shared by every decoder in the dispatch table
pub(crate) type Decoder = fn(&[&str], &mut Status, usize) -> DecodeResult;

const TITLE_FIELDS: usize = 2;
const TIME_FIELDS: usize = 2;
const CLIENT_V1_FIELDS: usize = 5;
const CLIENT_FIELDS: usize = 12;
const ROUTE_FIELDS: usize = 6;

/// `TITLE,<description>`
pub(crate) fn decode_title(fields: &[&str], status: &mut Status, line: usize) -> DecodeResult {
    require_fields(fields, TITLE_FIELDS, "TITLE", line)?;
    status.title = fields[1].to_string();
    Ok(())
}

/// `TIME,<human readable>,<epoch>`; everything after the tag is kept
pub(crate) fn decode_time(fields: &[&str], status: &mut Status, line: usize) -> DecodeResult {
    require_fields(fields, TIME_FIELDS, "TIME", line)?;
    status.time = fields[1..].iter().map(|f| f.to_string()).collect();
    Ok(())
}

/// Version 1 client line:
/// `<cn>,<real addr:port>,<bytes received>,<bytes sent>,<connected since>`
///
/// Trailing fields past the fifth are ignored.
pub(crate) fn decode_client_v1(fields: &[&str], status: &mut Status, line: usize) -> DecodeResult {
    require_fields(fields, CLIENT_V1_FIELDS, "CLIENT_LIST_V1", line)?;

    let mut numbers = Numbers::new(line);
    let client = Client {
        common_name: fields[0].to_string(),
        real_address: strip_port(fields[1]).to_string(),
        bytes_received: numbers.parse("bytesReceived", fields[2]),
        bytes_sent: numbers.parse("bytesSent", fields[3]),
        connected_since: fields[4].to_string(),
        ..Client::default()
    };

    status.client_list.push(client);
    numbers.finish()
}

/// Version 2/3 `CLIENT_LIST` line. Field 13 (data cipher) is optional.
pub(crate) fn decode_client(fields: &[&str], status: &mut Status, line: usize) -> DecodeResult {
    require_fields(fields, CLIENT_FIELDS, "CLIENT_LIST", line)?;

    let mut numbers = Numbers::new(line);
    let client = Client {
        common_name: fields[1].to_string(),
        real_address: strip_port(fields[2]).to_string(),
        virtual_address: non_empty(fields[3]),
        virtual_ipv6_address: non_empty(fields[4]),
        bytes_received: numbers.parse("bytesReceived", fields[5]),
        bytes_sent: numbers.parse("bytesSent", fields[6]),
        connected_since: fields[7].to_string(),
        connected_since_time: numbers.parse("connectedSinceTime", fields[8]),
        username: non_empty(fields[9]),
        client_id: numbers.parse_opt("clientId", fields[10]),
        peer_id: numbers.parse_opt("peerId", fields[11]),
        data_cipher: fields.get(12).and_then(|f| non_empty(f)),
    };

    status.client_list.push(client);
    numbers.finish()
}

/// `ROUTING_TABLE,<virtual addr>,<cn>,<real addr:port>,<last ref>,<last ref epoch>`
pub(crate) fn decode_route(fields: &[&str], status: &mut Status, line: usize) -> DecodeResult {
    require_fields(fields, ROUTE_FIELDS, "ROUTING_TABLE", line)?;

    let mut numbers = Numbers::new(line);
    let route = Route {
        virtual_address: fields[1].to_string(),
        common_name: fields[2].to_string(),
        real_address: strip_port(fields[3]).to_string(),
        last_ref: fields[4].to_string(),
        last_ref_time: numbers.parse("lastRefTime", fields[5]),
    };

    status.routing_table.push(route);
    numbers.finish()
}

/// Drop the port from `addr:port`, splitting on the last colon so IPv6
/// addresses survive. Brackets around the host are removed.
pub(crate) fn strip_port(addr: &str) -> &str {
    let host = match addr.rsplit_once(':') {
        Some((host, _port)) => host,
        None => addr,
    };
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

fn require_fields(fields: &[&str], expected: usize, record: &'static str, line: usize) -> DecodeResult {
    if fields.len() < expected {
        return Err(ParseError {
            line,
            field: record,
            value: fields.join(","),
            cause: FieldError::TooFewFields {
                expected,
                got: fields.len(),
            },
        });
    }
    Ok(())
}

fn non_empty(field: &str) -> Option<String> {
    (!field.is_empty()).then(|| field.to_string())
}

/// Numeric field parser for one line. Keeps only the first failure.
struct Numbers {
    line: usize,
    error: Option<ParseError>,
}

impl Numbers {
    fn new(line: usize) -> Self {
        Self { line, error: None }
    }

    /// Empty and invalid values both yield zero
    fn parse<T>(&mut self, field: &'static str, raw: &str) -> T
    where
        T: FromStr<Err = ParseIntError> + Default,
    {
        self.parse_opt(field, raw).unwrap_or_default()
    }

    /// Empty yields `None` silently; invalid yields `None` and records an error
    fn parse_opt<T>(&mut self, field: &'static str, raw: &str) -> Option<T>
    where
        T: FromStr<Err = ParseIntError>,
    {
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                let line = self.line;
                self.error.get_or_insert_with(|| ParseError {
                    line,
                    field,
                    value: raw.to_string(),
                    cause: e.into(),
                });
                None
            }
        }
    }

    fn finish(self) -> DecodeResult {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
