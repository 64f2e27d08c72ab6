use std::collections::BTreeMap;

use super::entity::{Datapath, DatapathId};

/// Set of currently connected datapaths, keyed by id.
///
/// Only connected datapaths are held; a datapath that leaves is removed.
#[derive(Debug, Default)]
pub struct DatapathTable {
    datapaths: BTreeMap<DatapathId, Datapath>,
}

impl DatapathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the datapath was not already present.
    pub fn register(&mut self, id: DatapathId) -> bool {
        if self.datapaths.contains_key(&id) {
            return false;
        }
        self.datapaths.insert(id, Datapath::connected(id));
        true
    }

    /// Remove a datapath, returning its entry if it was present.
    pub fn unregister(&mut self, id: DatapathId) -> Option<Datapath> {
        self.datapaths.remove(&id)
    }

    pub fn contains(&self, id: DatapathId) -> bool {
        self.datapaths.contains_key(&id)
    }

    pub fn get(&self, id: DatapathId) -> Option<&Datapath> {
        self.datapaths.get(&id)
    }

    /// Connected datapath ids in ascending order.
    pub fn list(&self) -> Vec<DatapathId> {
        self.datapaths.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.datapaths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datapaths.is_empty()
    }
}
