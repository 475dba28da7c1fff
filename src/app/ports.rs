//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService (domain)
//! ```
//!
//! Driven adapters (encoder, clock, display, storage, pumps and relays,
//! event sinks) implement these traits.  The
//! [`ControllerService`](super::service::ControllerService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::menu::render::{FieldStyle, Notice};

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: encoder ISR → domain)
// ───────────────────────────────────────────────────────────────

/// Encoder position and button edges, written asynchronously by interrupts.
///
/// The domain reads the position once per tick and consumes each press
/// exactly once.
pub trait InputPort {
    /// Current signed detent count.
    fn position(&self) -> i32;

    /// Move the detent count to `position` (menu transitions, clamping,
    /// edit exit).  Detents that arrived after the last `position()` read
    /// are kept on top.
    fn set_position(&mut self, position: i32);

    /// Consume a pending short press.  Returns `true` at most once per press.
    fn take_press(&mut self) -> bool;

    /// Consume a pending long press.
    fn take_long_press(&mut self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Broken-down local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 0 = Sunday.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallClock {
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

/// Board subsystems that came up at boot.  A failed one stays inert
/// while the rest of the controller keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareHealth {
    /// Encoder GPIO and its interrupt handlers.
    pub input: bool,
    /// Relay and LED outputs.
    pub outputs: bool,
    /// LEDC channels driving the pumps.
    pub pumps: bool,
}

impl HardwareHealth {
    pub const ALL_UP: Self = Self {
        input: true,
        outputs: true,
        pumps: true,
    };

    pub fn is_degraded(&self) -> bool {
        !(self.input && self.outputs && self.pumps)
    }
}

impl Default for HardwareHealth {
    fn default() -> Self {
        Self::ALL_UP
    }
}

pub trait ClockPort {
    /// Milliseconds since boot.  Wraps after ~49 days; consumers use
    /// wrapping arithmetic.
    fn uptime_ms(&self) -> u32;

    /// Local wall-clock time, or `None` while the RTC is missing or unsynced.
    fn wall_clock(&self) -> Option<WallClock>;
}

// ───────────────────────────────────────────────────────────────
// Render port (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Row-oriented drawing surface.  The core never reads pixels back.
pub trait RenderPort {
    /// Clear the whole screen.
    fn clear(&mut self);

    /// Clear one content row.
    fn clear_row(&mut self, row: usize);

    fn draw_header(&mut self, title: &str);

    /// One entry of a selectable list.
    fn draw_list_row(&mut self, row: usize, text: &str, selected: bool);

    /// A `label: value` editor row.
    fn draw_field_row(&mut self, row: usize, label: &str, value: &str, style: FieldStyle);

    /// Non-selectable informational text.
    fn draw_text_row(&mut self, row: usize, text: &str);

    /// Modal confirmation frame; the answer rows are drawn as list rows.
    fn draw_dialog(&mut self, title: &str, message: &str);

    /// Transient overlay drawn on top of the current screen.
    fn draw_notice(&mut self, notice: &Notice);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget output control.  Ids outside 1..=4 are ignored.
pub trait ActuatorPort {
    /// Set pump `pump` to `duty` percent (clamped to 100; 0 = off).
    fn set_pump(&mut self, pump: u8, duty: u8);

    fn set_relay(&mut self, relay: u8, on: bool);

    /// Stop every pump and open every relay.
    fn all_off(&mut self) {
        for id in 1..=4 {
            self.set_pump(id, 0);
            self.set_relay(id, false);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`SystemConfig`].
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced key/blob storage.
///
/// Writes MUST be atomic per key.  The ESP-IDF NVS API guarantees this
/// natively; in-memory simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes copied into `buf`.
    /// A blob longer than `buf` is either truncated or rejected,
    /// depending on the backend.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// Remove every key in `namespace`.
    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored blob length differs from the record size.
    SizeMismatch,
    /// Blob could not be encoded or decoded.
    Corrupted,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::SizeMismatch => write!(f, "record size mismatch"),
            Self::Corrupted => write!(f, "record corrupted"),
        }
    }
}
