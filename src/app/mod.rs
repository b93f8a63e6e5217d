//! Application core — state ownership, ports, and the safety control loop.

pub mod control;
pub mod core;
pub mod events;
pub mod ports;
