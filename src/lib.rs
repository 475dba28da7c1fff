//! Hydroponics controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod days;
pub mod dosing;
pub mod error;
pub mod menu;
pub mod outlet;
pub mod records;
pub mod schedule;
pub mod storage;

pub mod adapters;
pub mod drivers;
pub mod pins;
