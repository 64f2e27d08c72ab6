pub mod noop_sink;
pub mod pushgateway_sink;
