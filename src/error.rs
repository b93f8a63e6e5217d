//! Unified error types for the crockpot firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! front ends' error handling uniform. All variants are `Copy` so they can
//! be cheaply passed across the control loop and remote interface without
//! allocation.
//!
//! Expected conditions (sensor fault, lock timeout, unparseable state
//! string) are values of this type, never panics; only unrecoverable
//! configuration errors at startup are allowed to abort the process.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The temperature sensor could not be read.
    Sensor(SensorError),
    /// A relay command failed.
    Actuator(ActuatorError),
    /// The shared-state lock could not be acquired within the bounded wait.
    LockTimeout,
    /// A state string could not be parsed.
    InvalidState,
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::LockTimeout => write!(f, "state lock acquisition timed out"),
            Self::InvalidState => write!(f, "unrecognised operating state"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// SPI transaction with the thermocouple converter failed.
    SpiTransfer,
    /// Sensor was never initialised (degraded boot).
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransfer => write!(f, "SPI transfer failed"),
            Self::NotInitialised => write!(f, "sensor not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO write to the relay pin failed.
    GpioWriteFailed,
    /// Channel identifier outside the configured channel set.
    InvalidChannel,
    /// Relay driver was never initialised.
    NotInitialised,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::InvalidChannel => write!(f, "invalid relay channel"),
            Self::NotInitialised => write!(f, "relay not initialised"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
