//! Structured application events emitted by the core.

use crate::safety::Interlock;
use crate::state::{OperatingState, StatusSnapshot};

/// Events flowing out of the core through an
/// [`EventSink`](super::ports::EventSink).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Core finished initialisation.
    Started,
    /// A front end changed the operating state.
    StateChanged {
        from: OperatingState,
        to: OperatingState,
    },
    /// A safety interlock forced the pot OFF.
    InterlockTripped(Interlock),
    /// The sensor-fault flag flipped (true = fault began, false = cleared).
    SensorFault(bool),
    /// Periodic status report.
    StatusReport(StatusSnapshot),
}
