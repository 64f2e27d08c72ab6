use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Source label used when an alert carries no source address.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Transport protocol reported by the detection engine.
///
/// Classification is case-insensitive. Only `Tcp` and `Icmp` feed
/// protocol-specific counters; everything else is still an attack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertProtocol {
    Tcp,
    Icmp,
    /// Any other non-empty protocol string, lowercased.
    Other(String),
    /// Field absent or empty.
    Unknown,
}

impl AlertProtocol {
    /// Classify a raw protocol field.
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Unknown;
        };
        match raw.to_ascii_lowercase().as_str() {
            "tcp" => Self::Tcp,
            "icmp" => Self::Icmp,
            other => Self::Other(other.to_string()),
        }
    }

    /// Short label used in logs and metrics.
    pub fn as_label(&self) -> &str {
        match self {
            Self::Tcp => "tcp",
            Self::Icmp => "icmp",
            Self::Other(_) => "other",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AlertProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(name) => f.write_str(name),
            _ => f.write_str(self.as_label()),
        }
    }
}

/// One decoded alert line. Built once by the decoder and consumed once
/// by the mitigation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    pub source_address: Option<String>,
    pub protocol: AlertProtocol,
    pub message: String,
    /// The original line, trimmed.
    pub raw: String,
}

impl AlertRecord {
    pub fn new(
        source_address: Option<String>,
        protocol: AlertProtocol,
        message: String,
        raw: String,
    ) -> Self {
        let source_address = source_address
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            source_address,
            protocol,
            message,
            raw,
        }
    }

    /// The source address, or [`UNKNOWN_SOURCE`] if the alert had none.
    pub fn source_or_unknown(&self) -> &str {
        self.source_address.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }

    /// The source as an IP address, if it parses as one.
    ///
    /// Snort's `src_ap` style `"ip:port"` values are accepted for IPv4.
    pub fn source_ip(&self) -> Option<IpAddr> {
        let src = self.source_address.as_deref()?;
        if let Ok(ip) = src.parse::<IpAddr>() {
            return Some(ip);
        }
        let (host, port) = src.rsplit_once(':')?;
        if port.parse::<u16>().is_err() || host.contains(':') {
            return None;
        }
        host.parse::<IpAddr>().ok()
    }
}

// ── Field mapping ───────────────────────────────────────────────────

/// Which JSON keys hold the source, protocol and message of an alert.
///
/// Each list is tried in order and the first present, non-null key wins.
/// The defaults cover Snort 3 `alert_json` output as well as the plain
/// `source_address` / `protocol` / `message` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFieldMapping {
    #[serde(default = "default_source_fields")]
    pub source_fields: Vec<String>,
    #[serde(default = "default_protocol_fields")]
    pub protocol_fields: Vec<String>,
    #[serde(default = "default_message_fields")]
    pub message_fields: Vec<String>,
}

fn default_source_fields() -> Vec<String> {
    vec![
        "src_ip".to_string(),
        "src_addr".to_string(),
        "source_address".to_string(),
    ]
}

fn default_protocol_fields() -> Vec<String> {
    vec!["proto".to_string(), "protocol".to_string()]
}

fn default_message_fields() -> Vec<String> {
    vec!["msg".to_string(), "message".to_string()]
}

impl Default for AlertFieldMapping {
    fn default() -> Self {
        Self {
            source_fields: default_source_fields(),
            protocol_fields: default_protocol_fields(),
            message_fields: default_message_fields(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn record(src: Option<&str>) -> AlertRecord {
        AlertRecord::new(
            src.map(str::to_string),
            AlertProtocol::Tcp,
            "attack".to_string(),
            "{}".to_string(),
        )
    }

    // ── classify ─────────────────────────────────────────────────

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(AlertProtocol::classify(Some("tcp")), AlertProtocol::Tcp);
        assert_eq!(AlertProtocol::classify(Some("TCP")), AlertProtocol::Tcp);
        assert_eq!(AlertProtocol::classify(Some("ICMP")), AlertProtocol::Icmp);
        assert_eq!(AlertProtocol::classify(Some(" Icmp ")), AlertProtocol::Icmp);
    }

    #[test]
    fn classify_other_and_unknown() {
        assert_eq!(
            AlertProtocol::classify(Some("UDP")),
            AlertProtocol::Other("udp".to_string())
        );
        assert_eq!(AlertProtocol::classify(None), AlertProtocol::Unknown);
        assert_eq!(AlertProtocol::classify(Some("")), AlertProtocol::Unknown);
        assert_eq!(AlertProtocol::classify(Some("   ")), AlertProtocol::Unknown);
    }

    #[test]
    fn protocol_labels() {
        assert_eq!(AlertProtocol::Tcp.as_label(), "tcp");
        assert_eq!(AlertProtocol::Other("udp".into()).as_label(), "other");
        assert_eq!(AlertProtocol::Other("udp".into()).to_string(), "udp");
        assert_eq!(AlertProtocol::Unknown.to_string(), "unknown");
    }

    // ── source ───────────────────────────────────────────────────

    #[test]
    fn missing_source_falls_back_to_unknown() {
        assert_eq!(record(None).source_or_unknown(), "unknown");
        assert_eq!(record(Some("  ")).source_or_unknown(), "unknown");
        assert_eq!(record(Some("10.0.0.1")).source_or_unknown(), "10.0.0.1");
    }

    #[test]
    fn source_ip_parses_plain_and_ip_port() {
        let v4 = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(record(Some("10.0.0.1")).source_ip(), Some(v4));
        assert_eq!(record(Some("10.0.0.1:4444")).source_ip(), Some(v4));
        assert_eq!(
            record(Some("2001:db8::1")).source_ip(),
            Some("2001:db8::1".parse().unwrap())
        );
    }

    #[test]
    fn source_ip_rejects_garbage() {
        assert_eq!(record(None).source_ip(), None);
        assert_eq!(record(Some("not-an-ip")).source_ip(), None);
        assert_eq!(record(Some("10.0.0.1:http")).source_ip(), None);
    }

    #[test]
    fn default_mapping_covers_snort_and_plain_keys() {
        let m = AlertFieldMapping::default();
        assert!(m.source_fields.contains(&"src_ip".to_string()));
        assert!(m.source_fields.contains(&"source_address".to_string()));
        assert!(m.protocol_fields.contains(&"proto".to_string()));
        assert!(m.message_fields.contains(&"msg".to_string()));
    }
}
