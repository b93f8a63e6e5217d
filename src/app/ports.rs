//! Port traits — the boundary between the control core and the hardware.
//!
//! ```text
//!   Driver ──▶ Port trait ──▶ CrockpotCore / ControlLoop (domain)
//! ```
//!
//! Real drivers (MAX31855 SPI, relay GPIO, WiFi station) implement these
//! traits; host-side tests swap in mocks. The core only ever sees the
//! traits, so the entire safety kernel runs unmodified on the host.

use crate::error::{ActuatorError, SensorError};
use crate::state::OperatingState;

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Supplies raw 32-bit thermocouple frames.
///
/// Decoding is deliberately *not* part of the port: the control loop feeds
/// the frame through [`decode`](crate::sensors::thermocouple::decode) so
/// frame interpretation stays a pure, host-testable function.
pub trait SensorPort {
    /// Read one raw frame from the sensor bus.
    fn sample(&mut self) -> Result<u32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Relay port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Identifies one physical relay output.
///
/// Currently a single channel; kept as an enum so a future warm-element or
/// multi-level build extends the channel set instead of the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayChannel {
    /// Main heating element.
    Main,
}

/// Write-side port: the core calls this to drive the heating element.
///
/// Implementations own the last-commanded output per channel and must only
/// update it after the physical write succeeds.
pub trait RelayPort {
    /// Drive a channel to the given logical level (polarity handled inside).
    fn apply(&mut self, channel: RelayChannel, on: bool) -> Result<(), ActuatorError>;

    /// Last successfully commanded logical level for a channel.
    fn read_last(&self, channel: RelayChannel) -> bool;

    /// Fail-safe primitive: best-effort drive of every channel to OFF,
    /// independent of the normal state-update path.
    fn all_off(&mut self);

    /// Translate an operating state into relay outputs: OFF de-energises,
    /// every heating state energises the single main channel.
    fn apply_for_state(&mut self, state: OperatingState) -> Result<(), ActuatorError> {
        self.apply(RelayChannel::Main, state.heating())
    }
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (pure query)
// ───────────────────────────────────────────────────────────────

/// Network status as seen by the control loop. Strictly a read — the loop
/// never drives connection management.
pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;
}

/// Always-disconnected stand-in for offline boots and tests.
pub struct NoConnectivity;

impl ConnectivityPort for NoConnectivity {
    fn is_connected(&self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s through
/// this port. Adapters decide where they go (serial log today; a network
/// sink would implement the same trait).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Sink that drops every event (tests that don't assert on events).
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: &super::events::AppEvent) {}
}
