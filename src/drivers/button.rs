//! Debounced front-panel button driver.
//!
//! Three active-low momentary switches (Up / Down / Power) with external
//! pull-ups, polled by the UI task. A press is reported once on the
//! falling edge after the debounce window; holding a button does not
//! repeat.
//!
//! On the host the physical level comes from per-button atomics so UI
//! tests can inject presses without hardware.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::drivers::hw_init;
use crate::pins;

const DEBOUNCE_MS: u32 = 50;

/// Which front-panel button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Up,
    Down,
    Power,
}

impl ButtonId {
    fn gpio(self) -> i32 {
        match self {
            Self::Up => pins::BUTTON_UP_GPIO,
            Self::Down => pins::BUTTON_DOWN_GPIO,
            Self::Power => pins::BUTTON_POWER_GPIO,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Power => 2,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_PRESSED: [AtomicBool; 3] = [
    AtomicBool::new(false),
    AtomicBool::new(false),
    AtomicBool::new(false),
];

/// Host/test injection: set whether a button is currently held down.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_pressed(id: ButtonId, pressed: bool) {
    SIM_PRESSED[id.index()].store(pressed, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Released,
    Settling { since_ms: u32 },
    Held,
}

/// Per-button debounce state machine.
struct Debouncer {
    id: ButtonId,
    state: DebounceState,
}

impl Debouncer {
    fn new(id: ButtonId) -> Self {
        Self {
            id,
            state: DebounceState::Released,
        }
    }

    fn is_pressed_hw(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            // Active low: pressed pulls the pin to ground.
            !hw_init::gpio_read(self.id.gpio())
        }
        #[cfg(not(target_os = "espidf"))]
        {
            let _ = hw_init::gpio_read(self.id.gpio());
            SIM_PRESSED[self.id.index()].load(Ordering::Relaxed)
        }
    }

    /// Returns true exactly once per debounced press.
    fn tick(&mut self, now_ms: u32) -> bool {
        let pressed = self.is_pressed_hw();
        match self.state {
            DebounceState::Released => {
                if pressed {
                    self.state = DebounceState::Settling { since_ms: now_ms };
                }
                false
            }
            DebounceState::Settling { since_ms } => {
                if !pressed {
                    self.state = DebounceState::Released;
                    false
                } else if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = DebounceState::Held;
                    true
                } else {
                    false
                }
            }
            DebounceState::Held => {
                if !pressed {
                    self.state = DebounceState::Released;
                }
                false
            }
        }
    }
}

/// The three-button front panel.
pub struct ButtonPanel {
    buttons: [Debouncer; 3],
}

impl ButtonPanel {
    pub fn new() -> Self {
        Self {
            buttons: [
                Debouncer::new(ButtonId::Up),
                Debouncer::new(ButtonId::Down),
                Debouncer::new(ButtonId::Power),
            ],
        }
    }

    /// Poll all buttons. `now_ms` is monotonic milliseconds. At most one
    /// press is reported per tick (first in Up/Down/Power order wins —
    /// simultaneous presses are not a meaningful gesture on this panel).
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonId> {
        for b in &mut self.buttons {
            if b.tick(now_ms) {
                return Some(b.id);
            }
        }
        None
    }
}
