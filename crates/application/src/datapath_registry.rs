use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use domain::datapath::entity::{Datapath, DatapathId};
use domain::datapath::table::DatapathTable;

/// Shared view of the datapaths currently attached to the controller.
///
/// Written by the lifecycle task, read by the enforcement gateway.
#[derive(Debug, Default)]
pub struct DatapathRegistry {
    table: RwLock<DatapathTable>,
}

impl DatapathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the datapath was newly registered.
    pub fn register(&self, id: DatapathId) -> bool {
        let changed = self
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(id);
        if changed {
            tracing::info!(dpid = %id, "datapath registered");
        } else {
            tracing::debug!(dpid = %id, "datapath already registered");
        }
        changed
    }

    /// Returns `true` if the datapath was registered before the call.
    pub fn unregister(&self, id: DatapathId) -> bool {
        let removed = self
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(id);
        match removed {
            Some(datapath) => {
                tracing::info!(
                    dpid = %id,
                    connected_secs = datapath.connected_for().as_secs(),
                    "datapath unregistered"
                );
                true
            }
            None => {
                tracing::debug!(dpid = %id, "datapath was not registered");
                false
            }
        }
    }

    /// How long `id` has been connected, if it is.
    pub fn connected_for(&self, id: DatapathId) -> Option<Duration> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(Datapath::connected_for)
    }

    /// Connected datapath ids in ascending order, as of the call.
    pub fn list(&self) -> Vec<DatapathId> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list()
    }

    pub fn contains(&self, id: DatapathId) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
