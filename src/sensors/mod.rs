//! Sensor drivers and pure decode logic.

pub mod thermocouple;
