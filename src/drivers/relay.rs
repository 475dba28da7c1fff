//! Outlet relay bank (four active-high relay coils).

use crate::drivers::hw_init;
use crate::pins;

pub const RELAY_COUNT: usize = pins::RELAY_GPIOS.len();

pub struct RelayBank {
    closed: [bool; RELAY_COUNT],
}

impl RelayBank {
    pub fn new() -> Self {
        Self {
            closed: [false; RELAY_COUNT],
        }
    }

    /// Energise or release `relay` (1-based).  Unknown ids are ignored.
    pub fn set(&mut self, relay: u8, on: bool) {
        let Some(slot) = usize::from(relay)
            .checked_sub(1)
            .filter(|&i| i < RELAY_COUNT)
        else {
            log::warn!("relay: ignoring unknown relay {}", relay);
            return;
        };
        hw_init::gpio_write(pins::RELAY_GPIOS[slot], on);
        self.closed[slot] = on;
    }

    pub fn open_all(&mut self) {
        for relay in 1..=RELAY_COUNT as u8 {
            self.set(relay, false);
        }
    }

    pub fn is_on(&self, relay: u8) -> bool {
        usize::from(relay)
            .checked_sub(1)
            .and_then(|i| self.closed.get(i))
            .copied()
            .unwrap_or(false)
    }
}

impl Default for RelayBank {
    fn default() -> Self {
        Self::new()
    }
}
