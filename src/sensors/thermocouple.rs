//! MAX31855 K-type thermocouple converter: frame decoding and SPI driver.
//!
//! The converter streams a fixed 32-bit frame, MSB first:
//!
//! ```text
//! 31..18  thermocouple temperature, 14-bit two's complement, 0.25 °C/LSB
//! 17      reserved
//! 16      fault flag
//! 15..4   cold-junction temperature, 12-bit two's complement, 0.0625 °C/LSB
//! 3       reserved
//! 2       short-to-VCC fault
//! 1       short-to-GND fault
//! 0       open-circuit fault
//! ```
//!
//! [`decode`] is a pure function over that frame; the [`Max31855`] driver
//! handles the bus. Neither ever panics — a bus error yields an invalid
//! reading the caller inspects, exactly like a sensor fault does.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the frame over SPI (initialised by hw_init).
//! On host/test: reads from a static AtomicU32 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use log::warn;

use crate::app::ports::SensorPort;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_RAW_FRAME: AtomicU32 = AtomicU32::new(0);

/// Host/test injection point for the next raw frame.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw_frame(raw: u32) {
    SIM_RAW_FRAME.store(raw, Ordering::Relaxed);
}

const FAULT_BIT: u32 = 1 << 16;
const FAULT_OPEN_CIRCUIT: u32 = 1 << 0;
const FAULT_SHORT_GND: u32 = 1 << 1;
const FAULT_SHORT_VCC: u32 = 1 << 2;

// ---------------------------------------------------------------------------
// Reading & fault classification
// ---------------------------------------------------------------------------

/// Thermocouple fault kinds, from the frame's low three bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermocoupleFault {
    /// No probe connected.
    OpenCircuit,
    /// Probe shorted to ground.
    ShortToGround,
    /// Probe shorted to the supply rail.
    ShortToVcc,
}

impl core::fmt::Display for ThermocoupleFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "open circuit (no probe connected)"),
            Self::ShortToGround => write!(f, "short to GND"),
            Self::ShortToVcc => write!(f, "short to VCC"),
        }
    }
}

/// One decoded temperature sample. Produced fresh on every decode; callers
/// must check `valid` before trusting the temperature fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub temperature_c: f32,
    pub temperature_f: f32,
    /// Cold-junction (reference) temperature. Decoded for diagnostics;
    /// no decision logic consumes it.
    pub cold_junction_c: f32,
    pub valid: bool,
    /// Sensor-side fault, if the frame flagged one. `None` with
    /// `valid == false` means a bus/transport error instead.
    pub fault: Option<ThermocoupleFault>,
}

impl TemperatureReading {
    /// Invalid reading for a bus/transport failure (no sensor fault kind).
    pub fn bus_error() -> Self {
        Self {
            temperature_c: 0.0,
            temperature_f: 0.0,
            cold_junction_c: 0.0,
            valid: false,
            fault: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pure decode
// ---------------------------------------------------------------------------

/// Decode a raw 32-bit MAX31855 frame into a calibrated reading.
pub fn decode(raw: u32) -> TemperatureReading {
    if raw & FAULT_BIT != 0 {
        // Multiple fault bits may be set at once; report one kind with
        // open-circuit taking priority so an unplugged probe is always
        // distinguishable from wiring shorts.
        let fault = if raw & FAULT_OPEN_CIRCUIT != 0 {
            ThermocoupleFault::OpenCircuit
        } else if raw & FAULT_SHORT_GND != 0 {
            ThermocoupleFault::ShortToGround
        } else if raw & FAULT_SHORT_VCC != 0 {
            ThermocoupleFault::ShortToVcc
        } else {
            // Fault flag with no kind bits: treat as open circuit, the
            // conservative diagnosis.
            ThermocoupleFault::OpenCircuit
        };
        return TemperatureReading {
            temperature_c: 0.0,
            temperature_f: 0.0,
            cold_junction_c: 0.0,
            valid: false,
            fault: Some(fault),
        };
    }

    // Thermocouple temperature: bits 31-18, 14-bit signed, 0.25 °C/LSB.
    let mut tc_raw = ((raw >> 18) & 0x3FFF) as i16;
    if tc_raw & 0x2000 != 0 {
        tc_raw |= !0x3FFF; // sign extend
    }
    let temperature_c = f32::from(tc_raw) * 0.25;

    // Cold junction: bits 15-4, 12-bit signed, 0.0625 °C/LSB.
    let mut cj_raw = ((raw >> 4) & 0x0FFF) as i16;
    if cj_raw & 0x0800 != 0 {
        cj_raw |= !0x0FFF;
    }
    let cold_junction_c = f32::from(cj_raw) * 0.0625;

    TemperatureReading {
        temperature_c,
        temperature_f: c_to_f(temperature_c),
        cold_junction_c,
        valid: true,
        fault: None,
    }
}

/// Celsius → Fahrenheit.
pub fn c_to_f(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Fahrenheit → Celsius.
pub fn f_to_c(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// MAX31855 bus driver implementing [`SensorPort`].
pub struct Max31855 {
    initialised: bool,
}

impl Max31855 {
    /// Construct the driver. `initialised` reflects whether the SPI bus
    /// came up; a dead bus degrades to permanent bus-error readings rather
    /// than blocking boot.
    pub fn new(initialised: bool) -> Self {
        if !initialised {
            warn!("MAX31855: starting without a working SPI bus, readings will be invalid");
        }
        Self { initialised }
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&self) -> Result<u32, SensorError> {
        crate::drivers::hw_init::spi_read_raw32().ok_or(SensorError::SpiTransfer)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&self) -> Result<u32, SensorError> {
        Ok(SIM_RAW_FRAME.load(Ordering::Relaxed))
    }
}

impl SensorPort for Max31855 {
    fn sample(&mut self) -> Result<u32, SensorError> {
        if !self.initialised {
            return Err(SensorError::NotInitialised);
        }
        self.read_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_100c_scenario_frame() {
        // Top 14 bits = 400 decimal → 400 × 0.25 = 100.0 °C.
        let r = decode(0x0640_0000);
        assert!(r.valid);
        assert_eq!(r.fault, None);
        assert!((r.temperature_c - 100.0).abs() < f32::EPSILON);
        assert!((r.temperature_f - 212.0).abs() < f32::EPSILON);
    }

    #[test]
    fn decodes_negative_temperature() {
        // Top 14 bits = -4 two's complement (0x3FFC) → -1.0 °C.
        let raw = 0x3FFCu32 << 18;
        let r = decode(raw);
        assert!(r.valid);
        assert!((r.temperature_c - (-1.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn fault_bit_with_open_circuit() {
        let r = decode(FAULT_BIT | 0b001);
        assert!(!r.valid);
        assert_eq!(r.fault, Some(ThermocoupleFault::OpenCircuit));
    }

    #[test]
    fn fault_kinds_classified() {
        assert_eq!(
            decode(FAULT_BIT | 0b010).fault,
            Some(ThermocoupleFault::ShortToGround)
        );
        assert_eq!(
            decode(FAULT_BIT | 0b100).fault,
            Some(ThermocoupleFault::ShortToVcc)
        );
    }

    #[test]
    fn open_circuit_wins_over_combined_shorts() {
        let r = decode(FAULT_BIT | 0b111);
        assert_eq!(r.fault, Some(ThermocoupleFault::OpenCircuit));
    }

    #[test]
    fn bus_error_reading_has_no_fault_kind() {
        let r = TemperatureReading::bus_error();
        assert!(!r.valid);
        assert_eq!(r.fault, None);
    }

    #[test]
    fn cold_junction_decoded() {
        // CJ field = 400 × 0.0625 = 25.0 °C; thermocouple field zero.
        let raw = 400u32 << 4;
        let r = decode(raw);
        assert!(r.valid);
        assert!((r.cold_junction_c - 25.0).abs() < f32::EPSILON);
        assert!((r.temperature_c - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn conversions_are_inverse() {
        for f in [-40.0f32, 32.0, 212.0, 300.0] {
            assert!((c_to_f(f_to_c(f)) - f).abs() < 1e-4);
        }
    }

    #[test]
    fn uninitialised_driver_reports_sensor_error() {
        let mut s = Max31855::new(false);
        assert_eq!(s.sample(), Err(SensorError::NotInitialised));
    }
}
