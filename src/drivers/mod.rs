//! Actuator and input drivers, hardware initialisation, and the watchdog.

pub mod button;
pub mod encoder;
pub mod hw_init;
pub mod pump;
pub mod relay;
pub mod watchdog;
