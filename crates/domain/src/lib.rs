#![forbid(unsafe_code)]

pub mod alert;
pub mod common;
pub mod datapath;
pub mod mitigation;
