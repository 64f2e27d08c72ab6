use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};

use domain::mitigation::engine::BlocklistEngine;
use domain::mitigation::entity::BlockEntry;

/// Shared, internally synchronized set of mitigated sources.
///
/// Read by the mitigation engine and the datapath lifecycle task
/// concurrently. The lock only guards in-memory map operations and is
/// never held across an `.await`.
#[derive(Debug, Default)]
pub struct BlockedSourceRegistry {
    engine: RwLock<BlocklistEngine>,
}

impl BlockedSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_blocked(ip)
    }

    /// Record `ip` as blocked. Returns `false` if it already was.
    pub fn insert(&self, ip: IpAddr, reason: &str) -> bool {
        let inserted = self
            .engine
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(BlockEntry::new(ip, reason));
        if inserted {
            tracing::info!(%ip, reason, "source blocked");
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of blocked addresses in ascending order.
    pub fn blocked_ips(&self) -> Vec<IpAddr> {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .blocked_ips()
    }

    pub fn entries(&self) -> Vec<BlockEntry> {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
    }
}
