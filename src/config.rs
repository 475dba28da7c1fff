//! System configuration parameters
//!
//! Timing tunables for the menu, the dosing scanner, and input handling.
//! Values can be overridden via NVS; the defaults match the shipped board.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Menu ---
    /// Inactivity before a non-home menu returns to the main screen (ms)
    pub menu_timeout_ms: u32,
    /// Control/display loop period (ms)
    pub display_tick_ms: u32,
    /// How long a toast notice stays on screen (ms)
    pub notice_duration_ms: u32,

    // --- Dosing ---
    /// Minimum spacing between schedule scans (ms)
    pub dosing_scan_interval_ms: u32,
    /// Minimum time before the same schedule slot may fire again (ms)
    pub dosing_cooldown_ms: u32,

    // --- Input ---
    /// Encoder switch debounce window (ms)
    pub button_debounce_ms: u32,
    /// Hold time that turns a press into a long press (ms)
    pub long_press_ms: u32,

    // --- Housekeeping ---
    /// Heartbeat LED toggle period (ms)
    pub heartbeat_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Menu
            menu_timeout_ms: 30_000,
            display_tick_ms: 50, // 20 Hz
            notice_duration_ms: 900,

            // Dosing
            dosing_scan_interval_ms: 1_000,
            dosing_cooldown_ms: 60_000,

            // Input
            button_debounce_ms: 200,
            long_press_ms: 1_000,

            // Housekeeping
            heartbeat_interval_ms: 1_000,
        }
    }
}
