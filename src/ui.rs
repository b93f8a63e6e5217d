//! Local button interface.
//!
//! Three momentary buttons drive the same `set_state` operation the
//! remote interface uses, so every interlock and actuation guarantee
//! applies identically. The mapping itself is a pure function,
//! [`next_state`], tested without hardware.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::core::CrockpotCore;
use crate::app::ports::{EventSink, RelayPort};
use crate::config::SystemConfig;
use crate::drivers::button::{ButtonId, ButtonPanel};
use crate::state::OperatingState;

/// State requested by one button press.
///
/// Up and Down walk the heat ladder and clamp at the ends. Power
/// toggles between off and a sensible cooking default (low); pressing
/// power while heating always lands on off.
pub fn next_state(current: OperatingState, button: ButtonId) -> OperatingState {
    match button {
        ButtonId::Up => current.step_up(),
        ButtonId::Down => current.step_down(),
        ButtonId::Power => {
            if current == OperatingState::Off {
                OperatingState::Low
            } else {
                OperatingState::Off
            }
        }
    }
}

/// Button poll loop; runs for the process lifetime on its own thread.
pub fn run<R, E>(core: Arc<CrockpotCore<R>>, mut sink: E, config: &SystemConfig) -> !
where
    R: RelayPort,
    E: EventSink,
{
    info!("ui: button panel started");
    let mut panel = ButtonPanel::new();
    let period = Duration::from_millis(u64::from(config.ui_poll_interval_ms));
    let start = Instant::now();
    loop {
        let now_ms = start.elapsed().as_millis() as u32;
        if let Some(button) = panel.tick(now_ms) {
            handle_press(&core, button, &mut sink);
        }
        thread::sleep(period);
    }
}

fn handle_press<R: RelayPort>(core: &CrockpotCore<R>, button: ButtonId, sink: &mut impl EventSink) {
    let current = core.get_status().state;
    let target = next_state(current, button);
    if target == current {
        return; // clamped at the end of the ladder
    }
    info!("ui: {button:?} pressed, {current} -> {target}");
    if let Err(e) = core.set_state(target, sink) {
        warn!("ui: set_state({target}) failed: {e}");
    }
}
