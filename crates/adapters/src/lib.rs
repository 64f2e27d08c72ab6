#![deny(unsafe_code)]

pub mod alert;
pub mod controller;
pub mod metrics;
