//! Crockpot state core.
//!
//! [`CrockpotCore`] owns the canonical [`StatusSnapshot`] *and* the relay
//! port behind one mutex, so state and physical output can never be
//! observed diverging: every actuation happens while the snapshot lock is
//! held, and the snapshot is only committed after the actuation succeeded.
//!
//! Every front end (local buttons, remote commands, status logger) and the
//! control loop go through this type; it is the single synchronisation
//! point in the system.
//!
//! ## Bounded lock waits
//!
//! No caller ever blocks indefinitely. Lock acquisition is a try-lock loop
//! with a deadline (100 ms by default):
//!
//! - `get_status` on timeout returns the last *published* snapshot from an
//!   atomic side-cache — front ends always get a value, possibly one cycle
//!   stale.
//! - `set_state` on timeout reports [`Error::LockTimeout`] and changes
//!   nothing.
//! - the control loop on timeout skips that cycle.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::{Error, Result};
use crate::safety::{Interlock, SafetySupervisor};
use crate::sensors::thermocouple::TemperatureReading;
use crate::state::{OperatingState, StatusSnapshot};

use super::events::AppEvent;
use super::ports::{EventSink, RelayPort};

// ---------------------------------------------------------------------------
// Published stale copy
// ---------------------------------------------------------------------------

/// Lock-free copy of the last committed snapshot, refreshed by every writer
/// while it still holds the main lock. Serves the `get_status` timeout path.
struct PublishedStatus {
    state: AtomicU8,
    temperature_f_bits: AtomicU32,
    uptime_seconds: AtomicU32,
    connectivity_ok: AtomicBool,
    sensor_fault: AtomicBool,
}

fn state_to_u8(s: OperatingState) -> u8 {
    match s {
        OperatingState::Off => 0,
        OperatingState::Warm => 1,
        OperatingState::Low => 2,
        OperatingState::High => 3,
    }
}

fn state_from_u8(v: u8) -> OperatingState {
    match v {
        1 => OperatingState::Warm,
        2 => OperatingState::Low,
        3 => OperatingState::High,
        _ => OperatingState::Off,
    }
}

impl PublishedStatus {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            temperature_f_bits: AtomicU32::new(0.0f32.to_bits()),
            uptime_seconds: AtomicU32::new(0),
            connectivity_ok: AtomicBool::new(false),
            sensor_fault: AtomicBool::new(false),
        }
    }

    /// Callers must hold the core lock, which serialises publishes.
    fn publish(&self, snap: &StatusSnapshot) {
        self.state.store(state_to_u8(snap.state), Ordering::Relaxed);
        self.temperature_f_bits
            .store(snap.temperature_f.to_bits(), Ordering::Relaxed);
        self.uptime_seconds
            .store(snap.uptime_seconds, Ordering::Relaxed);
        self.connectivity_ok
            .store(snap.connectivity_ok, Ordering::Relaxed);
        self.sensor_fault
            .store(snap.sensor_fault, Ordering::Release);
    }

    fn load(&self) -> StatusSnapshot {
        let sensor_fault = self.sensor_fault.load(Ordering::Acquire);
        StatusSnapshot {
            state: state_from_u8(self.state.load(Ordering::Relaxed)),
            temperature_f: f32::from_bits(self.temperature_f_bits.load(Ordering::Relaxed)),
            uptime_seconds: self.uptime_seconds.load(Ordering::Relaxed),
            connectivity_ok: self.connectivity_ok.load(Ordering::Relaxed),
            sensor_fault,
        }
    }
}

// ---------------------------------------------------------------------------
// CrockpotCore
// ---------------------------------------------------------------------------

struct Inner<R> {
    snapshot: StatusSnapshot,
    relay: R,
}

/// The authoritative operating state plus the relay it governs.
pub struct CrockpotCore<R: RelayPort> {
    inner: Mutex<Inner<R>>,
    published: PublishedStatus,
    start: Instant,
    lock_timeout: Duration,
}

impl<R: RelayPort> CrockpotCore<R> {
    /// Initialise the core around an already-constructed relay driver.
    ///
    /// Forces every output OFF before anything else can run and records the
    /// monotonic start instant for uptime. The temperature subsystem is not
    /// required here: a pot without a working sensor is still controllable,
    /// it just reports `sensor_fault` until a read succeeds.
    pub fn new(mut relay: R, config: &SystemConfig) -> Self {
        relay.all_off();
        let snapshot = StatusSnapshot::default();
        let published = PublishedStatus::new();
        published.publish(&snapshot);
        info!("crockpot core initialised, state=off");
        Self {
            inner: Mutex::new(Inner { snapshot, relay }),
            published,
            start: Instant::now(),
            lock_timeout: Duration::from_millis(u64::from(config.lock_timeout_ms)),
        }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner<R>>> {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Ok(guard),
                // A panicked holder left the state behind; the snapshot and
                // relay cache are plain data, so keep serving them.
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout);
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            }
        }
    }

    // ── Front-end operations ──────────────────────────────────

    /// Current status. Never fails: if the lock cannot be taken within the
    /// bounded wait, the last published snapshot is returned instead
    /// (availability over freshness).
    pub fn get_status(&self) -> StatusSnapshot {
        match self.lock_inner() {
            Ok(inner) => inner.snapshot,
            Err(_) => {
                warn!("get_status: lock timeout, serving last published snapshot");
                self.published.load()
            }
        }
    }

    /// Change the operating state.
    ///
    /// Actuates first and commits the snapshot only on actuation success,
    /// so the recorded state and the physical output never diverge. Lock
    /// timeout or actuation failure leaves everything untouched.
    pub fn set_state(&self, new_state: OperatingState, sink: &mut impl EventSink) -> Result<()> {
        let mut inner = self.lock_inner().inspect_err(|_| {
            warn!("set_state({new_state}): lock timeout, no change applied");
        })?;

        inner.relay.apply_for_state(new_state)?;

        let from = inner.snapshot.state;
        inner.snapshot.state = new_state;
        self.published.publish(&inner.snapshot);
        drop(inner);

        if from != new_state {
            sink.emit(&AppEvent::StateChanged {
                from,
                to: new_state,
            });
        }
        info!("state changed to: {new_state}");
        Ok(())
    }

    /// Last commanded relay output for the main channel (diagnostics/tests).
    pub fn heater_energised(&self) -> Result<bool> {
        let inner = self.lock_inner()?;
        Ok(inner
            .relay
            .read_last(crate::app::ports::RelayChannel::Main))
    }

    /// Seconds elapsed since core initialisation.
    pub fn uptime_seconds(&self) -> u32 {
        self.start.elapsed().as_secs() as u32
    }

    // ── Control-loop operation ────────────────────────────────

    /// Run one control cycle under the core lock: refresh telemetry fields,
    /// evaluate the safety interlocks, and force OFF if one trips.
    ///
    /// Atomic relative to `get_status`/`set_state`: a concurrent caller
    /// observes either the pre-cycle or the fully-updated post-cycle
    /// snapshot, never a mix.
    pub fn control_cycle(
        &self,
        reading: &TemperatureReading,
        connectivity_ok: bool,
        safety: &mut SafetySupervisor,
        sink: &mut impl EventSink,
    ) -> Result<Option<Interlock>> {
        let mut inner = self.lock_inner()?;

        // 1. Temperature / sensor-fault flag. A faulted cycle keeps the
        //    last valid temperature rather than showing 0°.
        let fault_before = inner.snapshot.sensor_fault;
        if reading.valid {
            inner.snapshot.temperature_f = reading.temperature_f;
            inner.snapshot.sensor_fault = false;
        } else {
            inner.snapshot.sensor_fault = true;
        }
        let fault_now = inner.snapshot.sensor_fault;

        // 2. Uptime + connectivity.
        inner.snapshot.uptime_seconds = self.uptime_seconds();
        inner.snapshot.connectivity_ok = connectivity_ok;

        // 3. Interlocks, evaluated against the pre-override state.
        let tripped = safety.evaluate(reading, inner.snapshot.state.heating());
        if let Some(interlock) = tripped {
            warn!("SAFETY: {interlock} interlock tripped, shutting off");
            inner.snapshot.state = OperatingState::Off;
            inner.relay.all_off();
        }

        self.published.publish(&inner.snapshot);
        drop(inner);

        if fault_now != fault_before {
            sink.emit(&AppEvent::SensorFault(fault_now));
        }
        if let Some(interlock) = tripped {
            sink.emit(&AppEvent::InterlockTripped(interlock));
        }
        Ok(tripped)
    }
}
