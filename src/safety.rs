//! Safety supervisor.
//!
//! Evaluated once per control cycle, under the core lock, *after* the
//! snapshot's telemetry fields are refreshed. A returned [`Interlock`]
//! means the cycle must force the pot OFF and kill the relay outputs,
//! overriding whatever state a front end requested.
//!
//! Two interlocks:
//!
//! 1. **Over-temperature** — a valid reading above the configured ceiling.
//! 2. **Sensor-fault streak** — consecutive invalid readings while the
//!    heater is energised. One flaky sample must not kill a 7-hour cook,
//!    but heating blind indefinitely is not acceptable either.
//!
//! The streak counter resets on any valid reading and whenever the heater
//! is already OFF, so intermittent faults across unrelated OFF/ON cycles
//! never accumulate. This is stricter than the reference firmware, which
//! only cleared the counter after a trip; see DESIGN.md.

use log::warn;

use crate::config::SystemConfig;
use crate::sensors::thermocouple::TemperatureReading;

/// Which interlock forced the shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interlock {
    /// Valid reading above the safety ceiling.
    OverTemperature,
    /// Sensor faulted for more than the tolerated streak while heating.
    SensorFaultStreak,
}

impl core::fmt::Display for Interlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OverTemperature => write!(f, "over-temperature"),
            Self::SensorFaultStreak => write!(f, "persistent sensor fault"),
        }
    }
}

/// Safety supervisor: owns the fault-streak counter so its reset semantics
/// are explicit and testable, not an implicit static.
pub struct SafetySupervisor {
    safety_temp_f: f32,
    fault_limit: u32,
    fault_streak: u32,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            safety_temp_f: config.safety_temp_f,
            fault_limit: config.sensor_fault_limit,
            fault_streak: 0,
        }
    }

    /// Evaluate one cycle's reading against both interlocks.
    ///
    /// `heating` is the snapshot state *before* any override this cycle.
    pub fn evaluate(&mut self, reading: &TemperatureReading, heating: bool) -> Option<Interlock> {
        if reading.valid {
            self.fault_streak = 0;
            if reading.temperature_f > self.safety_temp_f {
                warn!(
                    "SAFETY: temperature {:.1} F exceeds {:.1} F limit",
                    reading.temperature_f, self.safety_temp_f
                );
                return Some(Interlock::OverTemperature);
            }
            return None;
        }

        if !heating {
            // Nothing dangerous about a blind sensor while OFF.
            self.fault_streak = 0;
            return None;
        }

        self.fault_streak += 1;
        if self.fault_streak > self.fault_limit {
            warn!(
                "SAFETY: {} consecutive sensor faults while heating",
                self.fault_streak
            );
            self.fault_streak = 0;
            return Some(Interlock::SensorFaultStreak);
        }
        None
    }

    /// Current streak length (diagnostics).
    pub fn fault_streak(&self) -> u32 {
        self.fault_streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::thermocouple::{c_to_f, TemperatureReading};

    fn valid(temp_f: f32) -> TemperatureReading {
        TemperatureReading {
            temperature_c: crate::sensors::thermocouple::f_to_c(temp_f),
            temperature_f: temp_f,
            cold_junction_c: 25.0,
            valid: true,
            fault: None,
        }
    }

    fn faulted() -> TemperatureReading {
        TemperatureReading::bus_error()
    }

    fn supervisor() -> SafetySupervisor {
        SafetySupervisor::new(&SystemConfig::default())
    }

    #[test]
    fn normal_reading_trips_nothing() {
        let mut s = supervisor();
        assert_eq!(s.evaluate(&valid(190.0), true), None);
        assert_eq!(s.fault_streak(), 0);
    }

    #[test]
    fn over_temperature_trips_immediately() {
        let mut s = supervisor();
        assert_eq!(s.evaluate(&valid(301.0), true), Some(Interlock::OverTemperature));
    }

    #[test]
    fn over_temperature_trips_even_when_off() {
        // The ceiling guards the reading itself, not the commanded state.
        let mut s = supervisor();
        assert_eq!(s.evaluate(&valid(350.0), false), Some(Interlock::OverTemperature));
    }

    #[test]
    fn exactly_at_ceiling_does_not_trip() {
        let mut s = supervisor();
        assert_eq!(s.evaluate(&valid(300.0), true), None);
    }

    #[test]
    fn fault_streak_trips_on_eleventh_cycle() {
        let mut s = supervisor();
        for i in 1..=10 {
            assert_eq!(s.evaluate(&faulted(), true), None, "cycle {i}");
        }
        assert_eq!(s.evaluate(&faulted(), true), Some(Interlock::SensorFaultStreak));
        assert_eq!(s.fault_streak(), 0, "streak resets after trip");
    }

    #[test]
    fn valid_reading_resets_streak() {
        let mut s = supervisor();
        for _ in 0..8 {
            s.evaluate(&faulted(), true);
        }
        assert_eq!(s.fault_streak(), 8);
        s.evaluate(&valid(c_to_f(85.0)), true);
        assert_eq!(s.fault_streak(), 0);
        for _ in 0..10 {
            assert_eq!(s.evaluate(&faulted(), true), None);
        }
    }

    #[test]
    fn faults_while_off_do_not_accumulate() {
        let mut s = supervisor();
        for _ in 0..20 {
            assert_eq!(s.evaluate(&faulted(), false), None);
        }
        assert_eq!(s.fault_streak(), 0);
    }
}
