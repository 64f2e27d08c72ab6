use std::collections::HashMap;
use std::net::IpAddr;

use super::entity::BlockEntry;

/// In-memory set of mitigated source addresses.
///
/// Entries live for the process lifetime; there is no expiry or unblock
/// path. Insertion is idempotent so callers can use its return value to
/// decide whether enforcement already happened.
#[derive(Debug, Default)]
pub struct BlocklistEngine {
    entries: HashMap<IpAddr, BlockEntry>,
}

impl BlocklistEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.entries.contains_key(&ip)
    }

    /// Insert a block entry. Returns `false` and leaves the existing entry
    /// untouched if the address is already present.
    pub fn insert(&mut self, entry: BlockEntry) -> bool {
        if self.entries.contains_key(&entry.ip) {
            return false;
        }
        self.entries.insert(entry.ip, entry);
        true
    }

    pub fn get(&self, ip: IpAddr) -> Option<&BlockEntry> {
        self.entries.get(&ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<BlockEntry> {
        let mut out: Vec<BlockEntry> = self.entries.values().cloned().collect();
        out.sort_by_key(|e| (e.blocked_at, e.ip));
        out
    }

    /// Blocked addresses in ascending order.
    pub fn blocked_ips(&self) -> Vec<IpAddr> {
        let mut ips: Vec<IpAddr> = self.entries.keys().copied().collect();
        ips.sort_unstable();
        ips
    }
}
