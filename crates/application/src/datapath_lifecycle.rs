use std::sync::Arc;

use domain::datapath::entity::{DatapathEvent, DatapathId, FlowRule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::blocked_source_registry::BlockedSourceRegistry;
use crate::datapath_registry::DatapathRegistry;
use crate::enforcement_gateway::EnforcementGateway;

/// Applies control-plane join/leave notifications to the datapath
/// registry.
///
/// On join the datapath is registered first, then optionally given the
/// table-miss rule and every source blocked so far, so a block racing
/// with the join reaches the switch through one path or the other.
pub struct DatapathLifecycleService {
    datapaths: Arc<DatapathRegistry>,
    blocked: Arc<BlockedSourceRegistry>,
    gateway: Arc<EnforcementGateway>,
    install_table_miss: bool,
    replay_on_join: bool,
}

impl DatapathLifecycleService {
    pub fn new(
        datapaths: Arc<DatapathRegistry>,
        blocked: Arc<BlockedSourceRegistry>,
        gateway: Arc<EnforcementGateway>,
    ) -> Self {
        Self {
            datapaths,
            blocked,
            gateway,
            install_table_miss: false,
            replay_on_join: true,
        }
    }

    #[must_use]
    pub fn with_table_miss(mut self, enabled: bool) -> Self {
        self.install_table_miss = enabled;
        self
    }

    #[must_use]
    pub fn with_replay_on_join(mut self, enabled: bool) -> Self {
        self.replay_on_join = enabled;
        self
    }

    pub async fn handle(&self, event: DatapathEvent) {
        match event {
            DatapathEvent::Joined(dpid) => self.on_joined(dpid).await,
            DatapathEvent::Left(dpid) => {
                self.datapaths.unregister(dpid);
            }
        }
    }

    async fn on_joined(&self, dpid: DatapathId) {
        if !self.datapaths.register(dpid) {
            return;
        }

        if self.install_table_miss
            && let Err(e) = self.gateway.install_on(dpid, &FlowRule::table_miss()).await
        {
            tracing::warn!(dpid = %dpid, error = %e, "table-miss rule not installed");
        }

        if self.replay_on_join {
            let ips = self.blocked.blocked_ips();
            if ips.is_empty() {
                return;
            }
            let installed = self.gateway.replay(dpid, &ips).await;
            tracing::info!(
                dpid = %dpid,
                blocked_sources = ips.len(),
                installed,
                "blocked sources replayed onto datapath"
            );
        }
    }

    /// Consume datapath events until the channel closes or `cancel_token`
    /// fires.
    pub async fn run(self, mut rx: mpsc::Receiver<DatapathEvent>, cancel_token: CancellationToken) {
        let mut count: u64 = 0;

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    while let Ok(event) = rx.try_recv() {
                        count += 1;
                        self.handle(event).await;
                    }
                    break;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(event) => {
                            count += 1;
                            self.handle(event).await;
                        }
                        None => break,
                    }
                }
            }
        }

        tracing::info!(
            total_events = count,
            connected = self.datapaths.len(),
            "datapath lifecycle stopped"
        );
    }
}
