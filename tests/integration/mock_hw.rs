//! Mock adapters for integration tests.
//!
//! Records every actuator call and event so tests can assert on the full
//! history without touching real GPIO/LEDC registers.

use std::cell::Cell;
use std::collections::HashMap;

use hydrocontroller::adapters::display::TextDisplay;
use hydrocontroller::app::events::AppEvent;
use hydrocontroller::app::ports::{
    ActuatorPort, ClockPort, ConfigError, ConfigPort, EventSink, InputPort, StorageError,
    StoragePort, WallClock,
};
use hydrocontroller::app::service::ControllerService;
use hydrocontroller::config::SystemConfig;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetPump { pump: u8, duty: u8 },
    SetRelay { relay: u8, on: bool },
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    pub fn last_call(&self) -> Option<&ActuatorCall> {
        self.calls.last()
    }

    /// Last duty commanded for `pump`, `AllOff` counting as zero.
    pub fn pump_duty(&self, pump: u8) -> u8 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetPump { pump: p, duty } if *p == pump => Some(*duty),
                ActuatorCall::AllOff => Some(0),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn relay_on(&self, relay: u8) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetRelay { relay: r, on } if *r == relay => Some(*on),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Pump commands with a non-zero duty, in call order.
    pub fn pump_starts(&self) -> Vec<(u8, u8)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::SetPump { pump, duty } if *duty > 0 => Some((*pump, *duty)),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, pump: u8, duty: u8) {
        self.calls.push(ActuatorCall::SetPump { pump, duty });
    }

    fn set_relay(&mut self, relay: u8, on: bool) {
        self.calls.push(ActuatorCall::SetRelay { relay, on });
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── MockNvs ───────────────────────────────────────────────────

pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    /// When set, every write and erase fails with `IoError`.
    pub fail_writes: bool,
    saved_config: Cell<Option<u32>>,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            fail_writes: false,
            saved_config: Cell::new(None),
        }
    }

    pub fn key_count(&self, namespace: &str) -> usize {
        let prefix = format!("{}::", namespace);
        self.store.keys().filter(|k| k.starts_with(&prefix)).count()
    }

    /// `menu_timeout_ms` of the last config handed to `save`.
    pub fn saved_timeout(&self) -> Option<u32> {
        self.saved_config.get()
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = format!("{}::{}", namespace, key);
        match self.store.get(&k) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }

    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        let prefix = format!("{}::", namespace);
        self.store.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(SystemConfig::default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        if self.fail_writes {
            return Err(ConfigError::IoError);
        }
        self.saved_config.set(Some(config.menu_timeout_ms));
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Uptime and wall clock both set by the test.
pub struct MockClock {
    pub uptime_ms: u32,
    pub wall: Option<WallClock>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            uptime_ms: 0,
            wall: None,
        }
    }

    pub fn advance(&mut self, ms: u32) {
        self.uptime_ms = self.uptime_ms.wrapping_add(ms);
    }
}

impl ClockPort for MockClock {
    fn uptime_ms(&self) -> u32 {
        self.uptime_ms
    }

    fn wall_clock(&self) -> Option<WallClock> {
        self.wall
    }
}

/// A time in the week starting Sunday 2026-10-11.
#[allow(dead_code)]
pub fn wall(weekday: u8, hour: u8, minute: u8) -> WallClock {
    WallClock {
        year: 2026,
        month: 10,
        day: 11 + weekday,
        weekday,
        hour,
        minute,
        second: 0,
    }
}

// ── MockInput ─────────────────────────────────────────────────

/// Encoder stand-in: the test turns and presses, the menu consumes.
#[derive(Default)]
pub struct MockInput {
    pub position: i32,
    pub press: bool,
    pub long_press: bool,
}

impl InputPort for MockInput {
    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    fn take_press(&mut self) -> bool {
        std::mem::take(&mut self.press)
    }

    fn take_long_press(&mut self) -> bool {
        std::mem::take(&mut self.long_press)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Bench ─────────────────────────────────────────────────────

/// Control loop period used by [`Bench::tick`].
pub const TICK_MS: u32 = 50;

/// A started service wired to mock adapters and a text display.
pub struct Bench {
    pub app: ControllerService,
    pub clock: MockClock,
    pub input: MockInput,
    pub display: TextDisplay,
    pub hw: MockHardware,
    pub nvs: MockNvs,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Bench {
    pub fn new() -> Self {
        Self::with_nvs(MockNvs::new())
    }

    /// Boot against pre-populated storage.
    pub fn with_nvs(nvs: MockNvs) -> Self {
        let mut hw = MockHardware::new();
        let mut sink = RecordingSink::new();
        let mut app = ControllerService::load(SystemConfig::default(), &nvs);
        app.start(&mut hw, &mut sink);
        Self {
            app,
            clock: MockClock::new(),
            input: MockInput::default(),
            display: TextDisplay::new(),
            hw,
            nvs,
            sink,
        }
    }

    /// Advance one loop period and run the service once.
    pub fn tick(&mut self) {
        self.clock.advance(TICK_MS);
        self.app.tick(
            &self.clock,
            &mut self.input,
            &mut self.display,
            &mut self.hw,
            &mut self.nvs,
            &mut self.sink,
        );
    }

    /// Tick until `ms` of uptime has passed.
    pub fn run_for(&mut self, ms: u32) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    pub fn turn_to(&mut self, position: i32) {
        self.input.position = position;
        self.tick();
    }

    pub fn press(&mut self) {
        self.input.press = true;
        self.tick();
    }

    pub fn hold(&mut self) {
        self.input.long_press = true;
        self.tick();
    }

    pub fn set_wall(&mut self, now: Option<WallClock>) {
        self.clock.wall = now;
    }
}
