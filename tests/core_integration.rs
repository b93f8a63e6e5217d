//! Integration tests: front ends → CrockpotCore → relay, and the full
//! control-loop path from raw thermocouple frames to interlock actuation.

use std::sync::{Arc, Mutex};

use crockpot::app::control::ControlLoop;
use crockpot::app::core::CrockpotCore;
use crockpot::app::events::AppEvent;
use crockpot::app::ports::{
    ConnectivityPort, EventSink, NullEventSink, RelayChannel, RelayPort, SensorPort,
};
use crockpot::config::SystemConfig;
use crockpot::error::{ActuatorError, SensorError};
use crockpot::remote::{self, Command};
use crockpot::safety::Interlock;
use crockpot::state::OperatingState;

// ── Mock implementations ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayCall {
    Apply { on: bool },
    AllOff,
}

/// Relay that records every call and exposes the call log through a handle,
/// so it can be asserted on after moving into the core.
#[derive(Clone)]
struct RecordingRelay {
    calls: Arc<Mutex<Vec<RelayCall>>>,
    last: Arc<Mutex<bool>>,
}

impl RecordingRelay {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            last: Arc::new(Mutex::new(false)),
        }
    }
    fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().unwrap().clone()
    }
    fn energised(&self) -> bool {
        *self.last.lock().unwrap()
    }
}

impl RelayPort for RecordingRelay {
    fn apply(&mut self, _channel: RelayChannel, on: bool) -> Result<(), ActuatorError> {
        self.calls.lock().unwrap().push(RelayCall::Apply { on });
        *self.last.lock().unwrap() = on;
        Ok(())
    }
    fn read_last(&self, _channel: RelayChannel) -> bool {
        *self.last.lock().unwrap()
    }
    fn all_off(&mut self) {
        self.calls.lock().unwrap().push(RelayCall::AllOff);
        *self.last.lock().unwrap() = false;
    }
}

/// Sensor fed from a fixed script of frames; repeats the last frame when
/// the script runs out.
struct ScriptedSensor {
    frames: Vec<u32>,
    pos: usize,
}

impl ScriptedSensor {
    fn new(frames: Vec<u32>) -> Self {
        Self { frames, pos: 0 }
    }
}

impl SensorPort for ScriptedSensor {
    fn sample(&mut self) -> Result<u32, SensorError> {
        let frame = self.frames[self.pos.min(self.frames.len() - 1)];
        self.pos += 1;
        Ok(frame)
    }
}

struct AlwaysConnected;
impl ConnectivityPort for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }
}

/// Sink that records events into a shared log.
#[derive(Clone)]
struct RecordingSink(Arc<Mutex<Vec<AppEvent>>>);

impl RecordingSink {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
    fn events(&self) -> Vec<AppEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.lock().unwrap().push(*event);
    }
}

// Raw MAX31855 frames: thermocouple counts in bits 31..18, 0.25 °C/LSB.
const FRAME_100C: u32 = 400 << 18; // 212.0 °F
const FRAME_160C: u32 = 640 << 18; // 320.0 °F, above the 300 °F ceiling
const FRAME_OPEN_FAULT: u32 = (1 << 16) | 0x0001;

// ── Boot and command path ─────────────────────────────────────

#[test]
fn boot_forces_relay_off_before_anything_else() {
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay.clone(), &SystemConfig::default());

    assert_eq!(relay.calls()[0], RelayCall::AllOff);
    assert_eq!(core.get_status().state, OperatingState::Off);
    assert!(!relay.energised());
}

#[test]
fn remote_command_actuates_then_commits() {
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay.clone(), &SystemConfig::default());
    let sink = RecordingSink::new();

    let reply = remote::execute(
        Command::Set(OperatingState::High),
        &core,
        &mut sink.clone(),
    );

    assert_eq!(reply, "Crockpot set to HIGH");
    assert!(relay.energised());
    assert_eq!(core.get_status().state, OperatingState::High);
    assert!(sink.events().contains(&AppEvent::StateChanged {
        from: OperatingState::Off,
        to: OperatingState::High,
    }));
}

#[test]
fn status_report_reflects_control_loop_telemetry() {
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay, &SystemConfig::default());
    let config = SystemConfig::default();
    let mut control = ControlLoop::new(
        ScriptedSensor::new(vec![FRAME_100C]),
        AlwaysConnected,
        NullEventSink,
        &config,
    );

    control.cycle(&core);

    let text = remote::execute(Command::Status, &core, &mut NullEventSink);
    assert!(text.contains("Temperature: 212.0 F"), "{text}");
    assert!(text.contains("WiFi: Connected"), "{text}");
    assert!(text.contains("Sensor: OK"), "{text}");
}

// ── Safety interlocks, end to end ─────────────────────────────

#[test]
fn over_temperature_forces_off_and_deenergises() {
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay.clone(), &SystemConfig::default());
    let config = SystemConfig::default();
    let sink = RecordingSink::new();
    let mut control = ControlLoop::new(
        ScriptedSensor::new(vec![FRAME_100C, FRAME_160C]),
        AlwaysConnected,
        sink.clone(),
        &config,
    );

    core.set_state(OperatingState::High, &mut NullEventSink)
        .unwrap();
    control.cycle(&core); // 212 °F, nothing to do
    assert_eq!(core.get_status().state, OperatingState::High);

    control.cycle(&core); // 320 °F, interlock trips
    let status = core.get_status();
    assert_eq!(status.state, OperatingState::Off);
    assert!(!relay.energised());
    assert!((status.temperature_f - 320.0).abs() < 0.01);
    assert!(sink
        .events()
        .contains(&AppEvent::InterlockTripped(Interlock::OverTemperature)));
}

#[test]
fn fault_streak_trips_on_cycle_after_limit() {
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay.clone(), &SystemConfig::default());
    let config = SystemConfig::default();
    let sink = RecordingSink::new();
    let mut frames = vec![FRAME_100C];
    frames.extend(std::iter::repeat(FRAME_OPEN_FAULT).take(11));
    let mut control = ControlLoop::new(
        ScriptedSensor::new(frames),
        AlwaysConnected,
        sink.clone(),
        &config,
    );

    core.set_state(OperatingState::Low, &mut NullEventSink)
        .unwrap();
    control.cycle(&core); // valid reading

    // Ten consecutive faulted cycles are tolerated.
    for _ in 0..10 {
        control.cycle(&core);
    }
    assert_eq!(core.get_status().state, OperatingState::Low);
    assert!(core.get_status().sensor_fault);

    // The eleventh trips the streak interlock.
    control.cycle(&core);
    assert_eq!(core.get_status().state, OperatingState::Off);
    assert!(!relay.energised());
    assert!(sink
        .events()
        .contains(&AppEvent::InterlockTripped(Interlock::SensorFaultStreak)));
}

#[test]
fn faulted_sensor_keeps_last_valid_temperature() {
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay, &SystemConfig::default());
    let config = SystemConfig::default();
    let mut control = ControlLoop::new(
        ScriptedSensor::new(vec![FRAME_100C, FRAME_OPEN_FAULT]),
        AlwaysConnected,
        NullEventSink,
        &config,
    );

    control.cycle(&core);
    control.cycle(&core);

    let status = core.get_status();
    assert!(status.sensor_fault);
    assert!(
        (status.temperature_f - 212.0).abs() < 0.01,
        "stale temperature must survive a faulted cycle"
    );
}

#[test]
fn interlock_blocks_nothing_after_manual_restart() {
    // The interlock forces OFF but is not latched: a front end can
    // deliberately turn the pot back on afterwards.
    let relay = RecordingRelay::new();
    let core = CrockpotCore::new(relay.clone(), &SystemConfig::default());
    let config = SystemConfig::default();
    let mut control = ControlLoop::new(
        ScriptedSensor::new(vec![FRAME_160C, FRAME_100C]),
        AlwaysConnected,
        NullEventSink,
        &config,
    );

    core.set_state(OperatingState::High, &mut NullEventSink)
        .unwrap();
    control.cycle(&core); // trips
    assert_eq!(core.get_status().state, OperatingState::Off);

    core.set_state(OperatingState::Warm, &mut NullEventSink)
        .unwrap();
    control.cycle(&core); // 212 °F again, no trip
    assert_eq!(core.get_status().state, OperatingState::Warm);
    assert!(relay.energised());
}
