//! Relay/SSR driver for the heating element.
//!
//! Maps logical on/off through the board's drive polarity (some relay
//! boards are active-low) and caches the last commanded level per channel.
//! The cache is updated only after the physical write succeeds, so
//! `read_last` always reflects reality.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only (gpio_write is a no-op).

use log::{error, info};

use crate::app::ports::{RelayChannel, RelayPort};
use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

pub struct RelayDriver {
    active_high: bool,
    last_main: bool,
}

impl RelayDriver {
    /// Configure the driver and force the channel OFF. Assumes hw_init has
    /// already set the pin direction; this drives the level once more so
    /// the driver's cache starts in a known-true state.
    pub fn new(active_high: bool) -> Result<Self, ActuatorError> {
        let mut driver = Self {
            active_high,
            last_main: true, // force the upcoming OFF write through
        };
        driver.apply(RelayChannel::Main, false)?;
        info!(
            "relay: main channel on GPIO {} initialised OFF (active_{})",
            pins::RELAY_MAIN_GPIO,
            if active_high { "high" } else { "low" }
        );
        Ok(driver)
    }

    fn gpio_for(channel: RelayChannel) -> i32 {
        match channel {
            RelayChannel::Main => pins::RELAY_MAIN_GPIO,
        }
    }

    fn level_for(&self, on: bool) -> bool {
        if self.active_high {
            on
        } else {
            !on
        }
    }
}

impl RelayPort for RelayDriver {
    fn apply(&mut self, channel: RelayChannel, on: bool) -> Result<(), ActuatorError> {
        let pin = Self::gpio_for(channel);
        if !hw_init::gpio_write(pin, self.level_for(on)) {
            error!("relay: GPIO {pin} write failed");
            return Err(ActuatorError::GpioWriteFailed);
        }
        match channel {
            RelayChannel::Main => self.last_main = on,
        }
        Ok(())
    }

    fn read_last(&self, channel: RelayChannel) -> bool {
        match channel {
            RelayChannel::Main => self.last_main,
        }
    }

    /// Emergency shutoff. Writes the pin directly instead of going through
    /// `apply` so it cannot be blocked by a failed status path; the cache
    /// is forced to OFF regardless of the write result.
    fn all_off(&mut self) {
        let pin = Self::gpio_for(RelayChannel::Main);
        if !hw_init::gpio_write(pin, self.level_for(false)) {
            error!("relay: all_off GPIO {pin} write failed");
        }
        self.last_main = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OperatingState;

    #[test]
    fn starts_off() {
        let r = RelayDriver::new(true).unwrap();
        assert!(!r.read_last(RelayChannel::Main));
    }

    #[test]
    fn apply_updates_cache() {
        let mut r = RelayDriver::new(true).unwrap();
        r.apply(RelayChannel::Main, true).unwrap();
        assert!(r.read_last(RelayChannel::Main));
        r.apply(RelayChannel::Main, false).unwrap();
        assert!(!r.read_last(RelayChannel::Main));
    }

    #[test]
    fn polarity_does_not_change_logical_cache() {
        let mut r = RelayDriver::new(false).unwrap();
        r.apply(RelayChannel::Main, true).unwrap();
        // read_last reports the logical level, not the pin level.
        assert!(r.read_last(RelayChannel::Main));
    }

    #[test]
    fn apply_for_state_maps_heating_states_to_on() {
        let mut r = RelayDriver::new(true).unwrap();
        for s in [OperatingState::Warm, OperatingState::Low, OperatingState::High] {
            r.apply_for_state(s).unwrap();
            assert!(r.read_last(RelayChannel::Main), "{s} must energise");
        }
        r.apply_for_state(OperatingState::Off).unwrap();
        assert!(!r.read_last(RelayChannel::Main));
    }

    #[test]
    fn all_off_clears_cache() {
        let mut r = RelayDriver::new(true).unwrap();
        r.apply(RelayChannel::Main, true).unwrap();
        r.all_off();
        assert!(!r.read_last(RelayChannel::Main));
    }
}
