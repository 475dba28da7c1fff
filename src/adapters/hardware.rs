//! Hardware adapter: bridges the pump and relay drivers to [`ActuatorPort`].
//!
//! This is the only module that drives outputs.  On non-espidf targets
//! the underlying drivers keep their state in memory, so the adapter
//! doubles as an inspectable fake.

use crate::app::ports::ActuatorPort;
use crate::drivers::pump::PumpBank;
use crate::drivers::relay::RelayBank;

/// Concrete adapter that combines all actuators behind the port trait.
pub struct HardwareAdapter {
    pumps: PumpBank,
    relays: RelayBank,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self::with_drivers(PumpBank::new(), RelayBank::new())
    }

    pub fn with_drivers(pumps: PumpBank, relays: RelayBank) -> Self {
        Self { pumps, relays }
    }

    pub fn pump_duty(&self, pump: u8) -> u8 {
        self.pumps.duty(pump)
    }

    pub fn relay_on(&self, relay: u8) -> bool {
        self.relays.is_on(relay)
    }
}

impl ActuatorPort for HardwareAdapter {
    fn set_pump(&mut self, pump: u8, duty: u8) {
        self.pumps.set(pump, duty);
    }

    fn set_relay(&mut self, relay: u8, on: bool) {
        self.relays.set(relay, on);
    }

    fn all_off(&mut self) {
        self.pumps.stop_all();
        self.relays.open_all();
    }
}
