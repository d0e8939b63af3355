//! OpenMetrics text exposition
//!
//! See <https://github.com/OpenObservability/OpenMetrics/blob/main/specification/OpenMetrics.md>

use super::Formatter;
use crate::error::Result;
use crate::status::{Client, Route, ServerInfo, Status};
use std::fmt::Display;

/// Metrics exposition for one status report.
///
/// Families, in order: per-client byte counters, connection duration (only
/// for clients with a connect epoch), connected flag, client and route
/// totals, per-route last reference, and an info gauge carrying the server
/// metadata. Output ends with `# EOF`.
///
/// Counter families are declared under their `_total` sample name, as the
/// Prometheus text parser accepts. Strict OpenMetrics parsers expect the
/// `# TYPE` line without the suffix and will reject these two families.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMetricsFormatter {
    /// Fixed "now" in epoch seconds; the wall clock is used when unset
    now: Option<i64>,
}

impl OpenMetricsFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed clock for connection durations
    pub fn with_now(now: i64) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

impl Formatter for OpenMetricsFormatter {
    fn format(&self, status: &Status) -> Result<String> {
        let now = self.now();
        let default_server = ServerInfo::default();
        let server = status.server.as_ref().unwrap_or(&default_server);
        let mut out = Exposition::default();

        out.family(
            "openvpn_client_bytes_received_total",
            "Total bytes received from client",
            "counter",
        );
        for client in &status.client_list {
            out.sample(
                "openvpn_client_bytes_received_total",
                &client_labels(client, server),
                client.bytes_received,
            );
        }

        out.family(
            "openvpn_client_bytes_sent_total",
            "Total bytes sent to client",
            "counter",
        );
        for client in &status.client_list {
            out.sample(
                "openvpn_client_bytes_sent_total",
                &client_labels(client, server),
                client.bytes_sent,
            );
        }

        // v1 files carry no connect epoch; skip the family entirely then
        let timed: Vec<&Client> = status
            .client_list
            .iter()
            .filter(|c| c.connected_since_time != 0)
            .collect();
        if !timed.is_empty() {
            out.family(
                "openvpn_client_connected_duration_seconds",
                "Time in seconds since client connected",
                "gauge",
            );
            for client in timed {
                out.sample(
                    "openvpn_client_connected_duration_seconds",
                    &client_labels(client, server),
                    now.saturating_sub(client.connected_since_time),
                );
            }
        }

        out.family(
            "openvpn_client_connected",
            "Client connection status (1 = connected)",
            "gauge",
        );
        for client in &status.client_list {
            out.sample("openvpn_client_connected", &client_labels(client, server), 1);
        }

        let server_labels = [("server_id", server.id.as_str())];

        out.family(
            "openvpn_clients_connected_total",
            "Total number of connected clients",
            "gauge",
        );
        out.sample(
            "openvpn_clients_connected_total",
            &server_labels,
            status.client_list.len(),
        );

        out.family(
            "openvpn_routing_entries_total",
            "Total number of routing table entries",
            "gauge",
        );
        out.sample(
            "openvpn_routing_entries_total",
            &server_labels,
            status.routing_table.len(),
        );

        out.family(
            "openvpn_routing_last_ref_seconds",
            "Unix timestamp of last routing table reference",
            "gauge",
        );
        for route in &status.routing_table {
            out.sample(
                "openvpn_routing_last_ref_seconds",
                &route_labels(route, server),
                route.last_ref_time,
            );
        }

        out.family(
            "openvpn_status_info",
            "OpenVPN status file metadata",
            "gauge",
        );
        let mut info = vec![
            ("title", status.title.as_str()),
            ("server_id", server.id.as_str()),
            ("server_local", server.local.as_str()),
            ("server_port", server.port.as_str()),
            ("server_proto", server.proto.as_str()),
            ("server_dev", server.dev.as_str()),
        ];
        if let Some(updated_at) = status.updated_at() {
            info.push(("updated_at", updated_at));
        }
        out.sample("openvpn_status_info", &info, 1);

        Ok(out.finish())
    }
}

fn client_labels<'a>(client: &'a Client, server: &'a ServerInfo) -> Vec<(&'static str, &'a str)> {
    let mut labels = vec![
        ("common_name", client.common_name.as_str()),
        ("real_address", client.real_address.as_str()),
        ("server_id", server.id.as_str()),
        ("virtual_address", client.virtual_address.as_deref().unwrap_or("")),
    ];
    if let Some(username) = client.username.as_deref() {
        labels.push(("username", username));
    }
    labels
}

fn route_labels<'a>(route: &'a Route, server: &'a ServerInfo) -> Vec<(&'static str, &'a str)> {
    vec![
        ("virtual_address", route.virtual_address.as_str()),
        ("common_name", route.common_name.as_str()),
        ("real_address", route.real_address.as_str()),
        ("server_id", server.id.as_str()),
    ]
}

/// Escape a label value: backslash, newline and double quote.
///
/// Backslashes go first so the escapes added afterwards are not doubled.
pub fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('\n', r"\n")
        .replace('"', r#"\""#)
}

#[derive(Default)]
struct Exposition {
    out: String,
}

impl Exposition {
    fn family(&mut self, name: &str, help: &str, kind: &str) {
        self.out.push_str(&format!("# HELP {name} {help}\n"));
        self.out.push_str(&format!("# TYPE {name} {kind}\n"));
    }

    fn sample(&mut self, name: &str, labels: &[(&str, &str)], value: impl Display) {
        let labels = labels
            .iter()
            .map(|(key, val)| format!("{key}=\"{}\"", escape_label_value(val)))
            .collect::<Vec<_>>()
            .join(",");
        self.out.push_str(&format!("{name}{{{labels}}} {value}\n"));
    }

    fn finish(mut self) -> String {
        self.out.push_str("# EOF\n");
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1732704645;

    fn sample_status() -> Status {
        Status {
            server: Some(ServerInfo {
                id: "test-server".to_string(),
                local: "192.168.1.100".to_string(),
                port: "1194".to_string(),
                proto: "udp".to_string(),
                dev: "tun".to_string(),
            }),
            title: "Test OpenVPN Server".to_string(),
            time: vec!["Thu Nov 27 10:30:45 2025".to_string(), NOW.to_string()],
            client_list: vec![Client {
                common_name: "user1".to_string(),
                real_address: "192.168.1.100".to_string(),
                virtual_address: Some("10.8.0.2".to_string()),
                bytes_received: 1048576,
                bytes_sent: 2097152,
                connected_since: "Thu Nov 27 09:30:45 2025".to_string(),
                connected_since_time: NOW - 3600,
                username: Some("user1".to_string()),
                ..Client::default()
            }],
            routing_table: vec![Route {
                virtual_address: "10.8.0.2".to_string(),
                common_name: "user1".to_string(),
                real_address: "192.168.1.100".to_string(),
                last_ref: "Thu Nov 27 10:30:45 2025".to_string(),
                last_ref_time: NOW,
            }],
        }
    }

    fn render(status: &Status) -> String {
        OpenMetricsFormatter::with_now(NOW).format(status).unwrap()
    }

    #[test]
    fn test_full_exposition() {
        let output = render(&sample_status());
        let client = r#"{common_name="user1",real_address="192.168.1.100",server_id="test-server",virtual_address="10.8.0.2",username="user1"}"#;

        assert!(output.contains(&format!("openvpn_client_bytes_received_total{client} 1048576\n")));
        assert!(output.contains(&format!("openvpn_client_bytes_sent_total{client} 2097152\n")));
        assert!(output.contains(&format!("openvpn_client_connected_duration_seconds{client} 3600\n")));
        assert!(output.contains(&format!("openvpn_client_connected{client} 1\n")));
        assert!(output.contains("openvpn_clients_connected_total{server_id=\"test-server\"} 1\n"));
        assert!(output.contains("openvpn_routing_entries_total{server_id=\"test-server\"} 1\n"));
        assert!(output.contains(
            r#"openvpn_routing_last_ref_seconds{virtual_address="10.8.0.2",common_name="user1",real_address="192.168.1.100",server_id="test-server"} 1732704645"#
        ));
        assert!(output.contains(
            r#"openvpn_status_info{title="Test OpenVPN Server",server_id="test-server",server_local="192.168.1.100",server_port="1194",server_proto="udp",server_dev="tun",updated_at="Thu Nov 27 10:30:45 2025"} 1"#
        ));
        assert!(output.contains("# HELP openvpn_client_bytes_received_total"));
        assert!(output.contains("# TYPE openvpn_client_bytes_received_total counter\n"));
        assert!(output.ends_with("# EOF\n"));
    }

    #[test]
    fn test_family_order() {
        let output = render(&sample_status());
        let families: Vec<&str> = output
            .lines()
            .filter_map(|l| l.strip_prefix("# TYPE "))
            .map(|l| l.split(' ').next().unwrap())
            .collect();
        assert_eq!(
            families,
            [
                "openvpn_client_bytes_received_total",
                "openvpn_client_bytes_sent_total",
                "openvpn_client_connected_duration_seconds",
                "openvpn_client_connected",
                "openvpn_clients_connected_total",
                "openvpn_routing_entries_total",
                "openvpn_routing_last_ref_seconds",
                "openvpn_status_info",
            ]
        );
    }

    #[test]
    fn test_no_clients() {
        let status = Status {
            server: Some(ServerInfo {
                id: "test".to_string(),
                ..ServerInfo::default()
            }),
            ..Status::default()
        };
        let output = render(&status);
        assert!(output.contains("openvpn_clients_connected_total{server_id=\"test\"} 0\n"));
        assert!(output.contains("openvpn_routing_entries_total{server_id=\"test\"} 0\n"));
        assert!(!output.contains("updated_at"));
    }

    #[test]
    fn test_no_duration_without_connect_epoch() {
        let mut status = sample_status();
        status.client_list[0].connected_since_time = 0;
        let output = render(&status);
        assert!(!output.contains("openvpn_client_connected_duration_seconds"));
        assert!(output.contains("openvpn_client_connected{"));
    }

    #[test]
    fn test_duration_saturates_on_extreme_epoch() {
        let outcome = crate::status::parse_str(
            "CLIENT_LIST\tu\t1.2.3.4:5\t10.8.0.2\t\t1\t2\tT\t-9223372036854775808\tu\t0\t0",
            crate::StatusVersion::V3,
        );
        assert!(outcome.is_clean());
        assert_eq!(outcome.status.client_list[0].connected_since_time, i64::MIN);

        let output = render(&outcome.status);
        assert!(output.contains(&format!(
            r#"openvpn_client_connected_duration_seconds{{common_name="u",real_address="1.2.3.4",server_id="",virtual_address="10.8.0.2",username="u"}} {}"#,
            i64::MAX
        )));

        let mut status = sample_status();
        status.client_list[0].connected_since_time = i64::MAX;
        let output = render(&status);
        let duration = output
            .lines()
            .find(|l| l.starts_with("openvpn_client_connected_duration_seconds{"))
            .unwrap();
        assert!(duration.ends_with(&format!(" {}", NOW - i64::MAX)));
    }

    #[test]
    fn test_username_label_omitted_when_absent() {
        let mut status = sample_status();
        status.client_list[0].username = None;
        status.client_list[0].virtual_address = None;
        let output = render(&status);
        assert!(!output.contains("username="));
        assert!(output.contains(r#"virtual_address="""#));
    }

    #[test]
    fn test_missing_server_metadata() {
        let mut status = sample_status();
        status.server = None;
        let output = render(&status);
        assert!(output.contains("openvpn_clients_connected_total{server_id=\"\"} 1\n"));
    }

    #[test]
    fn test_label_escaping() {
        let mut status = sample_status();
        status.client_list[0].common_name = r#"user"with"quotes"#.to_string();
        status.title = "line1\nline2 \\ end".to_string();
        let output = render(&status);
        assert!(output.contains(r#"common_name="user\"with\"quotes""#));
        assert!(output.contains(r#"title="line1\nline2 \\ end""#));
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("plain"), "plain");
        assert_eq!(escape_label_value(r"a\b"), r"a\\b");
        assert_eq!(escape_label_value("a\nb"), r"a\nb");
        assert_eq!(escape_label_value(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_label_value("\\\"\n"), r#"\\\"\n"#);
    }
}
