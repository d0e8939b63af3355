//! Line classification and decoder lookup

use super::decode::{self, DecodeResult, Decoder};
use super::{Status, StatusVersion};

/// Kind of a status line, taken from its leading tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Title,
    Time,
    Header,
    ClientList,
    RoutingTable,
    /// Any tag this parser does not know (`GLOBAL_STATS`, `END`, ...)
    Other,
}

impl LineKind {
    /// Classify a split line. Version 1 lines carry no tag and are always
    /// client records.
    fn classify(version: StatusVersion, fields: &[&str]) -> Self {
        if !version.is_tagged() {
            return LineKind::ClientList;
        }
        match fields.first().copied() {
            Some("TITLE") => LineKind::Title,
            Some("TIME") => LineKind::Time,
            Some("HEADER") => LineKind::Header,
            Some("CLIENT_LIST") => LineKind::ClientList,
            Some("ROUTING_TABLE") => LineKind::RoutingTable,
            _ => LineKind::Other,
        }
    }
}

/// Decoder for a line kind under a given layout; `None` means the line is
/// skipped without error.
fn decoder_for(version: StatusVersion, kind: LineKind) -> Option<Decoder> {
    use LineKind::*;
    use StatusVersion::*;

    match (version, kind) {
        (V1, ClientList) => Some(decode::decode_client_v1 as Decoder),
        (V2 | V3, ClientList) => Some(decode::decode_client as Decoder),
        (V2 | V3, RoutingTable) => Some(decode::decode_route as Decoder),
        (V2 | V3, Title) => Some(decode::decode_title as Decoder),
        (V2 | V3, Time) => Some(decode::decode_time as Decoder),
        (_, Header | Other) => None,
        (V1, Title | Time | RoutingTable) => None,
    }
}

/// Split one trimmed, non-empty line and feed it to the matching decoder
pub(crate) fn dispatch_line(
    line: &str,
    status: &mut Status,
    line_number: usize,
    version: StatusVersion,
) -> DecodeResult {
    let fields: Vec<&str> = line.split(version.delimiter()).collect();
    let kind = LineKind::classify(version, &fields);

    match decoder_for(version, kind) {
        Some(decoder) => decoder(&fields, status, line_number),
        None => {
            log::trace!("Skipping {kind:?} line {line_number}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tagged() {
        let v = StatusVersion::V2;
        assert_eq!(LineKind::classify(v, &["TITLE", "x"]), LineKind::Title);
        assert_eq!(LineKind::classify(v, &["TIME", "x"]), LineKind::Time);
        assert_eq!(LineKind::classify(v, &["HEADER", "CLIENT_LIST"]), LineKind::Header);
        assert_eq!(LineKind::classify(v, &["CLIENT_LIST"]), LineKind::ClientList);
        assert_eq!(LineKind::classify(v, &["ROUTING_TABLE"]), LineKind::RoutingTable);
        assert_eq!(LineKind::classify(v, &["GLOBAL_STATS", "Max bcast/mcast queue length", "0"]), LineKind::Other);
        assert_eq!(LineKind::classify(v, &["END"]), LineKind::Other);
    }

    #[test]
    fn test_classify_v1_is_always_client() {
        assert_eq!(
            LineKind::classify(StatusVersion::V1, &["TITLE", "x"]),
            LineKind::ClientList
        );
    }

    #[test]
    fn test_v1_has_no_routing_decoder() {
        assert!(decoder_for(StatusVersion::V1, LineKind::RoutingTable).is_none());
        assert!(decoder_for(StatusVersion::V1, LineKind::ClientList).is_some());
        assert!(decoder_for(StatusVersion::V3, LineKind::Header).is_none());
    }

    #[test]
    fn test_dispatch_uses_version_delimiter() {
        let mut status = Status::default();
        dispatch_line("TITLE\tServer, with comma", &mut status, 1, StatusVersion::V3).unwrap();
        assert_eq!(status.title, "Server, with comma");

        // a comma line under v3 is one field, which is an unknown tag
        dispatch_line("TITLE,Other", &mut status, 2, StatusVersion::V3).unwrap();
        assert_eq!(status.title, "Server, with comma");
    }

    #[test]
    fn test_unknown_and_header_lines_are_ignored() {
        let mut status = Status::default();
        for line in [
            "HEADER,CLIENT_LIST,Common Name,Real Address",
            "GLOBAL_STATS,Max bcast/mcast queue length,0",
            "END",
        ] {
            dispatch_line(line, &mut status, 1, StatusVersion::V2).unwrap();
        }
        assert_eq!(status, Status::default());
    }
}
