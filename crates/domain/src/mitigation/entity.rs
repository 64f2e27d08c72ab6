use std::net::IpAddr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::datapath::entity::TABLE_MISS_PRIORITY;

use super::error::MitigationError;

/// Keyword matched against alert messages when none is configured.
pub const DEFAULT_TRIGGER_KEYWORD: &str = "attack";

/// A source address that has been mitigated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub ip: IpAddr,
    /// Alert message that caused the block.
    pub reason: String,
    pub blocked_at: SystemTime,
}

impl BlockEntry {
    pub fn new(ip: IpAddr, reason: impl Into<String>) -> Self {
        Self {
            ip,
            reason: reason.into(),
            blocked_at: SystemTime::now(),
        }
    }
}

/// Decides whether an alert message asks for enforcement.
///
/// The match is a case-insensitive substring test on the free-text
/// message; detection rules are expected to put the keyword in `msg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPolicy {
    keyword: String,
}

impl TriggerPolicy {
    /// Build a policy for `keyword`. Empty or whitespace-only keywords
    /// would match every alert and are rejected.
    pub fn new(keyword: &str) -> Result<Self, MitigationError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(MitigationError::InvalidTrigger(
                "trigger keyword must not be empty".to_string(),
            ));
        }
        Ok(Self {
            keyword: keyword.to_lowercase(),
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn matches(&self, message: &str) -> bool {
        message.to_lowercase().contains(&self.keyword)
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_TRIGGER_KEYWORD.to_string(),
        }
    }
}

/// Check that drop rules win over both the fabric's forwarding rule and
/// the table-miss rule.
pub fn validate_drop_priority(priority: u16, forward_priority: u16) -> Result<(), MitigationError> {
    if priority <= forward_priority.max(TABLE_MISS_PRIORITY) {
        return Err(MitigationError::InvalidPriority {
            priority,
            reason: format!(
                "must be above the default forwarding priority {forward_priority} \
                 and the table-miss priority {TABLE_MISS_PRIORITY}"
            ),
        });
    }
    Ok(())
}
