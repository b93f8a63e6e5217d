//! Crockpot Controller — Main Entry Point
//!
//! Hexagonal architecture with thread-per-concern execution.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter      LogEventSink      WifiAdapter          │
//! │  (Sensor+Relay)       (EventSink)       (Connectivity)       │
//! │  TelegramInterface    ButtonPanel                            │
//! │  (Remote commands)    (Local UI)                             │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────        │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │            CrockpotCore (pure logic)                 │    │
//! │  │  State · Safety · Actuation                          │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  ControlLoop (1 s sampling) · Watchdog                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod pins;
mod remote;
mod safety;
mod state;
mod ui;

pub mod app;
mod adapters;
mod drivers;
mod sensors;

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::wifi::WifiAdapter;
use app::control::ControlLoop;
use app::core::CrockpotCore;
use app::events::AppEvent;
use app::ports::EventSink;
use config::SystemConfig;
use remote::TelegramInterface;

// Thread stack sizes. The control loop does SPI plus float maths; the
// remote thread parses JSON and needs headroom for TLS buffers.
const CONTROL_STACK_BYTES: usize = 4 * 1024;
const REMOTE_STACK_BYTES: usize = 8 * 1024;
const UI_STACK_BYTES: usize = 3 * 1024;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Crockpot Controller v{}          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();

    // ── 2. Initialise hardware peripherals ────────────────────
    // GPIO bring-up drives the relay pin to its idle (OFF) level before
    // anything else runs; a failure here means the heater line cannot be
    // guaranteed de-energised, so we halt and let the watchdog reset us.
    let report = match drivers::hw_init::init_peripherals(config.relay_active_high) {
        Ok(r) => r,
        Err(e) => {
            error!("HAL init failed: {} — halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };
    let watchdog = drivers::watchdog::Watchdog::new();

    // ── 3. Construct drivers ──────────────────────────────────
    // Relay construction repeats the forced-OFF write; failure is as
    // fatal as GPIO bring-up failure.
    let hw = match HardwareAdapter::new(&config, report) {
        Ok(hw) => hw,
        Err(e) => {
            error!("driver init failed: {} — halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };

    // ── 4. WiFi station (degraded mode on failure) ────────────
    let mut wifi = WifiAdapter::new(&config);
    let wifi_handle = wifi.status_handle();
    match (option_env!("CROCKPOT_WIFI_SSID"), option_env!("CROCKPOT_WIFI_PASSWORD")) {
        (Some(ssid), Some(password)) => {
            if let Err(e) = wifi.set_credentials(ssid, password) {
                warn!("wifi: bad build-time credentials ({e}), running offline");
            } else if let Err(e) = wifi.connect() {
                warn!("wifi: initial connect failed ({e}), retrying in background");
            }
        }
        _ => warn!("wifi: no build-time credentials, running offline"),
    }

    // ── 5. Construct the core ─────────────────────────────────
    let core = Arc::new(CrockpotCore::new(hw.relay, &config));
    let mut log_sink = LogEventSink::new();
    log_sink.emit(&AppEvent::Started);

    // ── 6. Spawn the worker threads ───────────────────────────
    let control = ControlLoop::new(hw.sensor, wifi_handle.clone(), LogEventSink::new(), &config);
    {
        let core = Arc::clone(&core);
        thread::Builder::new()
            .name("control".into())
            .stack_size(CONTROL_STACK_BYTES)
            .spawn(move || control.run(core))?;
    }

    if let Some(telegram) = TelegramInterface::new(option_env!("CROCKPOT_BOT_TOKEN").unwrap_or("")) {
        let core = Arc::clone(&core);
        let handle = wifi_handle.clone();
        let cfg = config.clone();
        thread::Builder::new()
            .name("telegram".into())
            .stack_size(REMOTE_STACK_BYTES)
            .spawn(move || telegram.run(core, handle, LogEventSink::new(), &cfg))?;
    }

    {
        let core = Arc::clone(&core);
        let cfg = config.clone();
        thread::Builder::new()
            .name("ui".into())
            .stack_size(UI_STACK_BYTES)
            .spawn(move || ui::run(core, LogEventSink::new(), &cfg))?;
    }

    info!("System ready.");

    // ── 7. Housekeeping loop ──────────────────────────────────
    // Status reporting, WiFi reconnection, and watchdog feeding live on
    // the main task; the safety-critical sampling runs on its own thread
    // and never blocks on any of this.
    let mut seconds: u32 = 0;
    loop {
        thread::sleep(Duration::from_secs(1));
        seconds = seconds.wrapping_add(1);

        if seconds % config.status_log_interval_secs == 0 {
            log_sink.emit(&AppEvent::StatusReport(core.get_status()));
        }

        wifi.poll();
        watchdog.feed();
    }
}
