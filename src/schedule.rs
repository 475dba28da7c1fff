//! Dosing and outlet schedule records and their fixed-capacity store.
//!
//! ```text
//!  ScheduleStore
//!  ├── dosing : ScheduleList<DosingSchedule, 24>
//!  └── outlets: ScheduleList<OutletSchedule, 10>
//! ```
//!
//! Lists are dense: removing entry `k` shifts `k+1..n` down one slot so
//! array order (which is also trigger priority) is preserved.  Persistence
//! lives in [`crate::storage`]; this module is pure data.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::ports::WallClock;
use crate::days::DayMask;
use crate::error::ValidationError;

// ═══════════════════════════════════════════════════════════════════════════
//  Limits
// ═══════════════════════════════════════════════════════════════════════════

pub const MAX_DOSING_SCHEDULES: usize = 24;
pub const MAX_OUTLET_SCHEDULES: usize = 10;

pub const PUMP_COUNT: u8 = 4;
pub const RELAY_COUNT: u8 = 4;

/// Largest dose in deci-millilitres (500.0 mL).
pub const MAX_DOSE_DML: u16 = 5000;

/// Outlet interval bounds in minutes.
pub const MIN_INTERVAL_MINUTES: u16 = 1;
pub const MAX_INTERVAL_MINUTES: u16 = 1440;

pub const fn is_valid_pump(pump: u8) -> bool {
    pump >= 1 && pump <= PUMP_COUNT
}

pub const fn is_valid_relay(relay: u8) -> bool {
    relay >= 1 && relay <= RELAY_COUNT
}

// ═══════════════════════════════════════════════════════════════════════════
//  Records
// ═══════════════════════════════════════════════════════════════════════════

/// Something that carries a day mask and can be committed to a list.
pub trait DayScheduled {
    fn days(&self) -> DayMask;
}

/// One timed dose of a single pump.
///
/// `is_interval` / `interval_minutes` are reserved: they are stored and
/// round-tripped but the dosing engine only does exact-minute matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosingSchedule {
    pub pump: u8,
    pub days: DayMask,
    pub hour: u8,
    pub minute: u8,
    /// Volume in tenths of a millilitre.
    pub amount_dml: u16,
    pub enabled: bool,
    pub is_interval: bool,
    pub interval_minutes: u16,
}

impl Default for DosingSchedule {
    fn default() -> Self {
        Self {
            pump: 1,
            days: DayMask::NONE,
            hour: 8,
            minute: 0,
            amount_dml: 10, // 1.0 mL
            enabled: false,
            is_interval: false,
            interval_minutes: 0,
        }
    }
}

impl DosingSchedule {
    /// Enabled, scheduled for today, and due this exact minute.
    pub fn is_due(&self, now: &WallClock) -> bool {
        self.enabled
            && self.days.is_active_on(now.weekday)
            && self.hour == now.hour
            && self.minute == now.minute
    }
}

impl DayScheduled for DosingSchedule {
    fn days(&self) -> DayMask {
        self.days
    }
}

/// Relay activation: either a daily on/off window or a repeat interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletSchedule {
    pub relay: u8,
    pub days: DayMask,
    pub hour_on: u8,
    pub minute_on: u8,
    pub hour_off: u8,
    pub minute_off: u8,
    /// When set, `interval_minutes` is authoritative and the window is ignored.
    pub is_interval: bool,
    pub interval_minutes: u16,
    pub enabled: bool,
}

impl Default for OutletSchedule {
    fn default() -> Self {
        Self {
            relay: 1,
            days: DayMask::NONE,
            hour_on: 6,
            minute_on: 0,
            hour_off: 22,
            minute_off: 0,
            is_interval: false,
            interval_minutes: 60,
            enabled: false,
        }
    }
}

impl OutletSchedule {
    pub fn on_minute_of_day(&self) -> u16 {
        u16::from(self.hour_on) * 60 + u16::from(self.minute_on)
    }

    pub fn off_minute_of_day(&self) -> u16 {
        u16::from(self.hour_off) * 60 + u16::from(self.minute_off)
    }
}

impl DayScheduled for OutletSchedule {
    fn days(&self) -> DayMask {
        self.days
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ScheduleList
// ═══════════════════════════════════════════════════════════════════════════

/// Dense, order-preserving, fixed-capacity list of schedule records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleList<T, const N: usize> {
    items: Vec<T, N>,
}

impl<T, const N: usize> Default for ScheduleList<T, N> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: DayScheduled, const N: usize> ScheduleList<T, N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Append a record, rejecting an empty day mask or a full list.
    ///
    /// Returns the slot index the record landed in.
    pub fn add(&mut self, record: T) -> Result<usize, ValidationError> {
        if record.days().is_empty() {
            return Err(ValidationError::NoDaysSelected);
        }
        self.items
            .push(record)
            .map_err(|_| ValidationError::ListFull)?;
        Ok(self.items.len() - 1)
    }

    /// Append without validation.  Used when loading from storage.
    pub(crate) fn push_loaded(&mut self, record: T) -> bool {
        self.items.push(record).is_ok()
    }

    /// Remove entry `index`, shifting later entries down.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ScheduleStore
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleStore {
    pub dosing: ScheduleList<DosingSchedule, MAX_DOSING_SCHEDULES>,
    pub outlets: ScheduleList<OutletSchedule, MAX_OUTLET_SCHEDULES>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.dosing.clear();
        self.outlets.clear();
    }
}
