pub mod flow_rule_port;
pub mod metrics_port;
pub mod metrics_sink;
