//! Adapters binding the port traits to real peripherals and services.

pub mod hardware;
pub mod log_sink;
pub mod wifi;
