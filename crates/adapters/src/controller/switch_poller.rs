use std::collections::BTreeSet;
use std::time::Duration;

use domain::common::error::DomainError;
use domain::datapath::entity::{DatapathEvent, DatapathId};
use domain::datapath::error::DatapathError;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{controller_client, normalize_base_url, request_error};

/// Discovers datapath connects and disconnects by polling the
/// controller's `GET /stats/switches` endpoint.
///
/// Each poll is compared with the previous one; new ids become
/// [`DatapathEvent::Joined`] and vanished ids [`DatapathEvent::Left`].
/// A failed poll leaves the known set untouched.
pub struct SwitchPoller {
    client: reqwest::Client,
    base_url: String,
    known: BTreeSet<DatapathId>,
}

impl SwitchPoller {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        Ok(Self {
            client: controller_client(timeout)?,
            base_url: normalize_base_url(base_url),
            known: BTreeSet::new(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/stats/switches", self.base_url)
    }

    pub fn known(&self) -> &BTreeSet<DatapathId> {
        &self.known
    }

    /// Fetch the set of datapaths currently connected to the controller.
    pub async fn fetch_switches(&self) -> Result<BTreeSet<DatapathId>, DomainError> {
        let response = self
            .client
            .get(self.endpoint())
            .send()
            .await
            .map_err(|e| request_error("list switches", &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DatapathError::ControllerUnreachable(format!(
                "list switches returned HTTP {status}"
            ))
            .into());
        }

        let ids: Vec<u64> = response.json().await.map_err(|e| {
            DomainError::ExternalCall(format!("list switches: invalid response body: {e}"))
        })?;
        Ok(ids.into_iter().map(DatapathId).collect())
    }

    /// Replace the known set with `current` and return the changes,
    /// departures first.
    pub fn apply(&mut self, current: BTreeSet<DatapathId>) -> Vec<DatapathEvent> {
        let left = self
            .known
            .difference(&current)
            .map(|id| DatapathEvent::Left(*id));
        let joined = current
            .difference(&self.known)
            .map(|id| DatapathEvent::Joined(*id));
        let events: Vec<DatapathEvent> = left.chain(joined).collect();
        self.known = current;
        events
    }

    pub async fn poll_once(&mut self) -> Result<Vec<DatapathEvent>, DomainError> {
        let current = self.fetch_switches().await?;
        Ok(self.apply(current))
    }

    /// Poll every `interval` (first poll immediately) until cancelled.
    pub async fn run(
        mut self,
        tx: mpsc::Sender<DatapathEvent>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let events = match self.poll_once().await {
                Ok(events) => {
                    if consecutive_failures > 0 {
                        info!(failures = consecutive_failures, "controller reachable again");
                    }
                    consecutive_failures = 0;
                    events
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        error = %e,
                        failures = consecutive_failures,
                        known = self.known.len(),
                        "switch poll failed, keeping last known datapaths"
                    );
                    continue;
                }
            };

            for event in events {
                debug!(dpid = %event.id(), ?event, "datapath change detected");
                if tx.send(event).await.is_err() {
                    info!("datapath event channel closed, stopping switch poller");
                    return;
                }
            }
        }

        info!(known = self.known.len(), "switch poller stopped");
    }
}
