//! Operating state and the shared status snapshot.
//!
//! [`OperatingState`] is the four-valued user-facing heat setting. It is
//! totally ordered by heat intensity (`Off < Warm < Low < High`) — the
//! ordering exists purely so the local UI can cycle through settings; the
//! control core only ever cares about the OFF / heating distinction.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ---------------------------------------------------------------------------
// OperatingState
// ---------------------------------------------------------------------------

/// Crockpot operating states, ordered by heat intensity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum OperatingState {
    #[default]
    Off,
    Warm,
    Low,
    High,
}

impl OperatingState {
    /// True for every state that energises the heating element.
    ///
    /// The physical design has a single on/off output, so all heating states
    /// actuate identically; differentiated heat levels are future work.
    pub fn heating(self) -> bool {
        self != Self::Off
    }

    /// Canonical lowercase literal, matching the remote command vocabulary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Warm => "warm",
            Self::Low => "low",
            Self::High => "high",
        }
    }

    /// One step hotter, clamped at `High` (no wrap-around).
    pub fn step_up(self) -> Self {
        match self {
            Self::Off => Self::Warm,
            Self::Warm => Self::Low,
            Self::Low | Self::High => Self::High,
        }
    }

    /// One step cooler, clamped at `Off` (no wrap-around).
    pub fn step_down(self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Low => Self::Warm,
            Self::Warm | Self::Off => Self::Off,
        }
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingState {
    type Err = Error;

    /// Case-insensitive parse of "off" / "warm" / "low" / "high".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("off") {
            Ok(Self::Off)
        } else if s.eq_ignore_ascii_case("warm") {
            Ok(Self::Warm)
        } else if s.eq_ignore_ascii_case("low") {
            Ok(Self::Low)
        } else if s.eq_ignore_ascii_case("high") {
            Ok(Self::High)
        } else {
            Err(Error::InvalidState)
        }
    }
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Complete crockpot status — the only state shared between the control
/// thread and the front ends.
///
/// Read and written as a unit under the core's lock: a reader never sees a
/// temperature from one control cycle paired with a state from another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Current operating state.
    pub state: OperatingState,
    /// Last valid thermocouple reading (Fahrenheit). Retains the previous
    /// value across faulted cycles — never shows a fault as 0 °F.
    pub temperature_f: f32,
    /// Seconds since the core was initialised (monotonic clock).
    pub uptime_seconds: u32,
    /// WiFi station connectivity at the last control cycle.
    pub connectivity_ok: bool,
    /// True iff the most recent decode attempt returned an invalid reading.
    pub sensor_fault: bool,
}
