use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::error::DatapathError;

pub const ETH_TYPE_IPV4: u16 = 0x0800;
pub const ETH_TYPE_IPV6: u16 = 0x86DD;

/// Priority of the match-all rule that punts unmatched packets to the controller.
pub const TABLE_MISS_PRIORITY: u16 = 0;
/// Priority of the fabric's forward-everything rule.
pub const DEFAULT_FORWARD_PRIORITY: u16 = 1;
/// Priority at which drop rules are installed.
pub const DEFAULT_DROP_PRIORITY: u16 = 100;

/// OpenFlow datapath identifier (64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatapathId(pub u64);

impl fmt::Display for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for DatapathId {
    type Err = DatapathError;

    /// Accepts decimal (`"1"`), `0x`-prefixed hex, or the 16-digit hex
    /// form produced by [`Display`](fmt::Display).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DatapathError::InvalidId(s.to_string());
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u64::from_str_radix(hex, 16).map(Self).map_err(|_| invalid());
        }
        if s.len() == 16 {
            return u64::from_str_radix(s, 16).map(Self).map_err(|_| invalid());
        }
        s.parse::<u64>().map(Self).map_err(|_| invalid())
    }
}

impl From<u64> for DatapathId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A switch attached to the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datapath {
    pub id: DatapathId,
    pub connected_at: SystemTime,
}

impl Datapath {
    pub fn connected(id: DatapathId) -> Self {
        Self {
            id,
            connected_at: SystemTime::now(),
        }
    }

    /// How long the datapath has been attached, zero if the clock went
    /// backwards.
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed().unwrap_or_default()
    }
}

/// Control-plane session lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatapathEvent {
    Joined(DatapathId),
    Left(DatapathId),
}

impl DatapathEvent {
    pub fn id(&self) -> DatapathId {
        match self {
            Self::Joined(id) | Self::Left(id) => *id,
        }
    }
}

// ── Flow rules ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowMatch {
    /// Wildcard match on every field.
    Any,
    /// `eth_type=0x0800, ipv4_src=<addr>`
    Ipv4Source(std::net::Ipv4Addr),
    /// `eth_type=0x86dd, ipv6_src=<addr>`
    Ipv6Source(std::net::Ipv6Addr),
}

impl FlowMatch {
    pub fn source(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Self::Ipv4Source(v4),
            IpAddr::V6(v6) => Self::Ipv6Source(v6),
        }
    }

    pub fn eth_type(&self) -> Option<u16> {
        match self {
            Self::Any => None,
            Self::Ipv4Source(_) => Some(ETH_TYPE_IPV4),
            Self::Ipv6Source(_) => Some(ETH_TYPE_IPV6),
        }
    }

    pub fn source_ip(&self) -> Option<IpAddr> {
        match self {
            Self::Any => None,
            Self::Ipv4Source(v4) => Some(IpAddr::V4(*v4)),
            Self::Ipv6Source(v6) => Some(IpAddr::V6(*v6)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    /// Send the whole packet to the controller.
    OutputController,
}

/// A flow-table entry to install on a datapath.
///
/// An empty action list drops matching packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRule {
    pub priority: u16,
    pub flow_match: FlowMatch,
    pub actions: Vec<FlowAction>,
}

impl FlowRule {
    pub fn drop_source(ip: IpAddr, priority: u16) -> Self {
        Self {
            priority,
            flow_match: FlowMatch::source(ip),
            actions: Vec::new(),
        }
    }

    pub fn table_miss() -> Self {
        Self {
            priority: TABLE_MISS_PRIORITY,
            flow_match: FlowMatch::Any,
            actions: vec![FlowAction::OutputController],
        }
    }

    pub fn is_drop(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpid_display_is_zero_padded_hex() {
        assert_eq!(DatapathId(1).to_string(), "0000000000000001");
        assert_eq!(DatapathId(0xabc).to_string(), "0000000000000abc");
    }

    #[test]
    fn dpid_parse_forms() {
        assert_eq!("1".parse::<DatapathId>().unwrap(), DatapathId(1));
        assert_eq!("0x1f".parse::<DatapathId>().unwrap(), DatapathId(31));
        assert_eq!(
            "0000000000000010".parse::<DatapathId>().unwrap(),
            DatapathId(16)
        );
        assert!("switch-1".parse::<DatapathId>().is_err());
    }

    #[test]
    fn drop_rule_for_ipv4() {
        let rule = FlowRule::drop_source("9.9.9.9".parse().unwrap(), DEFAULT_DROP_PRIORITY);
        assert!(rule.is_drop());
        assert_eq!(rule.priority, 100);
        assert_eq!(rule.flow_match.eth_type(), Some(0x0800));
        assert_eq!(
            rule.flow_match.source_ip(),
            Some("9.9.9.9".parse().unwrap())
        );
    }

    #[test]
    fn drop_rule_for_ipv6() {
        let rule = FlowRule::drop_source("2001:db8::1".parse().unwrap(), 200);
        assert_eq!(rule.flow_match.eth_type(), Some(0x86DD));
        assert!(matches!(rule.flow_match, FlowMatch::Ipv6Source(_)));
    }

    #[test]
    fn table_miss_sends_to_controller() {
        let rule = FlowRule::table_miss();
        assert_eq!(rule.priority, TABLE_MISS_PRIORITY);
        assert_eq!(rule.flow_match, FlowMatch::Any);
        assert!(!rule.is_drop());
    }

    #[test]
    fn event_id() {
        assert_eq!(DatapathEvent::Joined(DatapathId(3)).id(), DatapathId(3));
        assert_eq!(DatapathEvent::Left(DatapathId(4)).id(), DatapathId(4));
    }
}
