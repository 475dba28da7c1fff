//! Pump calibration and the auxiliary liquid-exchange records.
//!
//! Top-up and replace are stored and displayed only; nothing executes
//! them yet.

use serde::{Deserialize, Serialize};

use crate::schedule::{PUMP_COUNT, is_valid_pump};

/// Per-pump flow calibration consumed by the dosing engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpCalibration {
    /// Run duty in percent (0–100).
    pub pwm_percent: u8,
    /// Length of a calibration run in milliseconds.
    pub time_ms: u16,
    /// Measured delivery rate.
    pub ml_per_second: f32,
    pub is_calibrated: bool,
}

impl Default for PumpCalibration {
    fn default() -> Self {
        Self {
            pwm_percent: 50,
            time_ms: 1000,
            ml_per_second: 1.0,
            is_calibrated: false,
        }
    }
}

impl PumpCalibration {
    /// Milliseconds needed to deliver `amount_dml`, or `None` without a usable rate.
    pub fn run_duration_ms(&self, amount_dml: u16) -> Option<u32> {
        if self.ml_per_second <= 0.0 || !self.ml_per_second.is_finite() {
            return None;
        }
        let ml = f32::from(amount_dml) / 10.0;
        Some((ml / self.ml_per_second * 1000.0) as u32)
    }
}

/// Calibration for all four pumps, indexed by pump id 1..=4.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Calibrations([PumpCalibration; PUMP_COUNT as usize]);

impl Calibrations {
    pub fn for_pump(&self, pump: u8) -> Option<&PumpCalibration> {
        if is_valid_pump(pump) {
            self.0.get(usize::from(pump - 1))
        } else {
            None
        }
    }

    pub fn for_pump_mut(&mut self, pump: u8) -> Option<&mut PumpCalibration> {
        if is_valid_pump(pump) {
            self.0.get_mut(usize::from(pump - 1))
        } else {
            None
        }
    }

    /// Slot-ordered view (slot 0 = pump 1).
    pub fn as_slice(&self) -> &[PumpCalibration] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [PumpCalibration] {
        &mut self.0
    }
}

/// Top up the reservoir with nutrient from each pump, then run the fill relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUpConfig {
    /// Per-pump amounts in deci-millilitres.
    pub pump_dml: [u16; 4],
    pub fill_relay: u8,
    pub enabled: bool,
}

impl Default for TopUpConfig {
    fn default() -> Self {
        Self {
            pump_dml: [0; 4],
            fill_relay: 1,
            enabled: false,
        }
    }
}

/// Full solution change: drain, refill, re-dose, optionally on a weekly slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceConfig {
    pub pump_dml: [u16; 4],
    pub drain_relay: u8,
    pub fill_relay: u8,
    /// Weekday index, 0 = Sunday.
    pub schedule_day: u8,
    pub schedule_hour: u8,
    pub enabled: bool,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            pump_dml: [0; 4],
            drain_relay: 1,
            fill_relay: 2,
            schedule_day: 0,
            schedule_hour: 0,
            enabled: false,
        }
    }
}

/// Everything the menu edits besides the schedule lists.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AuxRecords {
    pub calibrations: Calibrations,
    pub top_up: TopUpConfig,
    pub replace: ReplaceConfig,
}
