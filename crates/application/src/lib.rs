#![forbid(unsafe_code)]

pub mod blocked_source_registry;
pub mod datapath_lifecycle;
pub mod datapath_registry;
pub mod enforcement_gateway;
pub mod metrics_aggregator;
pub mod mitigation_engine;
