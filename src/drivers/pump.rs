//! Peristaltic dosing pump bank.
//!
//! Four single-direction pumps, each on its own LEDC channel
//! (`channel = pump - 1`).  Speed is a duty percentage scaled onto the
//! 8-bit timer.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

pub const PUMP_COUNT: usize = 4;

/// Percent (clamped to 100) to an 8-bit LEDC duty.
pub fn duty_to_8bit(duty: u8) -> u8 {
    ((u16::from(duty.min(100))) * 255 / 100) as u8
}

pub struct PumpBank {
    duty: [u8; PUMP_COUNT],
}

impl PumpBank {
    pub fn new() -> Self {
        Self {
            duty: [0; PUMP_COUNT],
        }
    }

    /// Run `pump` (1-based) at `duty` percent; 0 stops it.
    /// Unknown pump ids are ignored.
    pub fn set(&mut self, pump: u8, duty: u8) {
        let Some(slot) = Self::slot(pump) else {
            log::warn!("pump: ignoring unknown pump {}", pump);
            return;
        };
        let duty = duty.min(100);
        hw_init::ledc_set(slot as u32, duty_to_8bit(duty));
        self.duty[slot] = duty;
    }

    pub fn stop_all(&mut self) {
        for pump in 1..=PUMP_COUNT as u8 {
            self.set(pump, 0);
        }
    }

    pub fn duty(&self, pump: u8) -> u8 {
        Self::slot(pump).map_or(0, |i| self.duty[i])
    }

    pub fn is_running(&self, pump: u8) -> bool {
        self.duty(pump) > 0
    }

    fn slot(pump: u8) -> Option<usize> {
        let i = usize::from(pump).checked_sub(1)?;
        (i < PUMP_COUNT).then_some(i)
    }
}

impl Default for PumpBank {
    fn default() -> Self {
        Self::new()
    }
}
