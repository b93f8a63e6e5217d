//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). A future MQTT or
//! push-notification adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StatusReport(s) => {
                info!(
                    "STATUS | state={} | temp={:.1}F | uptime={}s | wifi={} | sensor={}",
                    s.state,
                    s.temperature_f,
                    s.uptime_seconds,
                    if s.connectivity_ok { "OK" } else { "DISCONNECTED" },
                    if s.sensor_fault { "FAULT" } else { "OK" },
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            AppEvent::InterlockTripped(interlock) => {
                warn!("INTERLOCK | {interlock} -> forced off");
            }
            AppEvent::SensorFault(active) => {
                if *active {
                    warn!("SENSOR | fault began");
                } else {
                    info!("SENSOR | fault cleared");
                }
            }
            AppEvent::Started => {
                info!("START | core ready, state=off");
            }
        }
    }
}
