//! Safety control loop.
//!
//! A fixed-period loop (1 s by default) that samples the thermocouple,
//! refreshes the shared snapshot, and lets the safety supervisor override
//! the operating state. Runs for the lifetime of the system on its own
//! thread; there is no cancellation path.
//!
//! Scheduling is drift-corrected: each wake is computed against an absolute
//! deadline (`next += period`), not `sleep(period)`, so per-cycle jitter
//! does not accumulate over a long cook.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::safety::SafetySupervisor;
use crate::sensors::thermocouple::{self, TemperatureReading};

use super::core::CrockpotCore;
use super::ports::{ConnectivityPort, EventSink, RelayPort, SensorPort};

/// The periodic sampling/decision loop.
pub struct ControlLoop<S, C, E> {
    sensor: S,
    connectivity: C,
    sink: E,
    safety: SafetySupervisor,
    period: Duration,
}

impl<S, C, E> ControlLoop<S, C, E>
where
    S: SensorPort,
    C: ConnectivityPort,
    E: EventSink,
{
    pub fn new(sensor: S, connectivity: C, sink: E, config: &SystemConfig) -> Self {
        Self {
            sensor,
            connectivity,
            sink,
            safety: SafetySupervisor::new(config),
            period: Duration::from_millis(u64::from(config.control_interval_ms)),
        }
    }

    /// Execute exactly one control cycle. Split out from [`run`](Self::run)
    /// so host tests can drive cycles without a thread or a clock.
    pub fn cycle<R: RelayPort>(&mut self, core: &CrockpotCore<R>) {
        let reading = self.read_temperature();
        let connected = self.connectivity.is_connected();

        match core.control_cycle(&reading, connected, &mut self.safety, &mut self.sink) {
            Ok(Some(interlock)) => info!("control: forced off by {interlock} interlock"),
            Ok(None) => {}
            // Contention with a front end; the next tick retries. Nothing
            // was partially written.
            Err(e) => warn!("control: cycle skipped ({e})"),
        }
    }

    /// Sample and decode one reading. Bus/transport errors become an
    /// invalid reading with no fault kind — this function never fails.
    fn read_temperature(&mut self) -> TemperatureReading {
        match self.sensor.sample() {
            Ok(raw) => {
                let reading = thermocouple::decode(raw);
                if let Some(fault) = reading.fault {
                    debug!("thermocouple fault: {fault}");
                }
                reading
            }
            Err(e) => {
                debug!("thermocouple sample failed: {e}");
                TemperatureReading::bus_error()
            }
        }
    }

    /// Run forever at the configured period.
    pub fn run<R: RelayPort>(mut self, core: Arc<CrockpotCore<R>>) -> ! {
        info!(
            "control loop started, period {} ms",
            self.period.as_millis()
        );
        let mut next_wake = Instant::now() + self.period;
        loop {
            self.cycle(&core);

            // Absolute-deadline sleep; if a cycle overran one whole period,
            // resynchronise rather than burst to catch up.
            let now = Instant::now();
            if next_wake <= now {
                next_wake = now + self.period;
            }
            thread::sleep(next_wake - now);
            next_wake += self.period;
        }
    }
}
