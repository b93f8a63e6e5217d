//! Hardware drivers (GPIO relay, SPI bring-up, buttons, watchdog).

pub mod button;
pub mod hw_init;
pub mod relay;
pub mod watchdog;
