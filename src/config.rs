//! System configuration parameters
//!
//! All tunable parameters for the crockpot controller. Values are compiled
//! in; there is deliberately no persistence layer — the pot always powers up
//! OFF with factory tunables.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Safety ---
    /// Auto-shutoff ceiling in Fahrenheit. A valid reading above this forces
    /// the pot OFF regardless of the requested state.
    pub safety_temp_f: f32,
    /// Consecutive faulted control cycles (while heating) tolerated before
    /// the sensor-fault interlock forces the pot OFF.
    pub sensor_fault_limit: u32,

    // --- Timing ---
    /// Control loop period (milliseconds).
    pub control_interval_ms: u32,
    /// Bounded wait for the shared state lock (milliseconds).
    pub lock_timeout_ms: u32,
    /// Period of the periodic status log line (seconds).
    pub status_log_interval_secs: u32,
    /// Local UI button poll period (milliseconds).
    pub ui_poll_interval_ms: u32,
    /// Remote interface long-poll period (milliseconds).
    pub remote_poll_interval_ms: u32,

    // --- Hardware ---
    /// Relay drive polarity: true if the relay energises on a high level.
    pub relay_active_high: bool,

    // --- Connectivity ---
    /// WiFi reconnect attempts before giving up until the next poll.
    pub wifi_max_retry: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Safety
            safety_temp_f: 300.0,
            sensor_fault_limit: 10,

            // Timing
            control_interval_ms: 1000, // 1 Hz
            lock_timeout_ms: 100,
            status_log_interval_secs: 30,
            ui_poll_interval_ms: 50,
            remote_poll_interval_ms: 2000,

            // Hardware
            relay_active_high: true,

            // Connectivity
            wifi_max_retry: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.safety_temp_f > 212.0, "ceiling must be above boiling");
        assert!(c.sensor_fault_limit > 0);
        assert!(c.control_interval_ms > 0);
        assert!(c.lock_timeout_ms > 0);
        assert!(c.wifi_max_retry > 0);
    }

    #[test]
    fn lock_wait_shorter_than_control_period() {
        let c = SystemConfig::default();
        assert!(
            c.lock_timeout_ms < c.control_interval_ms,
            "a lock timeout longer than the control period would let callers starve the loop"
        );
    }

    #[test]
    fn ui_polls_faster_than_control_loop() {
        let c = SystemConfig::default();
        assert!(c.ui_poll_interval_ms < c.control_interval_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert!((c.safety_temp_f - c2.safety_temp_f).abs() < 0.001);
        assert_eq!(c.sensor_fault_limit, c2.sensor_fault_limit);
        assert_eq!(c.relay_active_high, c2.relay_active_high);
    }
}
