//! Task Watchdog Timer (TWDT) and heartbeat LED.
//!
//! The watchdog resets the device if the control loop stops feeding it
//! for longer than the configured timeout.  The heartbeat toggles
//! [`HEARTBEAT_LED_GPIO`](crate::pins::HEARTBEAT_LED_GPIO) so a stalled
//! loop is visible on the board before the watchdog fires.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::drivers::hw_init;
use crate::pins;

pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    timeout_ms: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT calls from the main task during boot.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("Watchdog: reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    log::info!("Watchdog: subscribed ({} ms timeout)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }
                Self { subscribed, timeout_ms }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op ({} ms)", timeout_ms);
            Self { timeout_ms }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Must be called more often than the timeout.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the TWDT entry of the subscribed task.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}

/// Toggles the heartbeat LED at a fixed period.
pub struct Heartbeat {
    period_ms: u32,
    last_toggle_ms: u32,
    lit: bool,
}

impl Heartbeat {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_toggle_ms: 0,
            lit: false,
        }
    }

    /// Toggle the LED if a full period has passed.  Returns the new
    /// level when it changed.
    pub fn tick(&mut self, now_ms: u32) -> Option<bool> {
        if now_ms.wrapping_sub(self.last_toggle_ms) < self.period_ms {
            return None;
        }
        self.last_toggle_ms = now_ms;
        self.lit = !self.lit;
        hw_init::gpio_write(pins::HEARTBEAT_LED_GPIO, self.lit);
        Some(self.lit)
    }

    pub fn set_period(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_toggles_once_per_period() {
        let mut hb = Heartbeat::new(1_000);
        assert_eq!(hb.tick(500), None);
        assert_eq!(hb.tick(1_000), Some(true));
        assert_eq!(hb.tick(1_500), None);
        assert_eq!(hb.tick(2_000), Some(false));
    }

    #[test]
    fn heartbeat_survives_uptime_wrap() {
        let mut hb = Heartbeat::new(1_000);
        hb.tick(u32::MAX - 100);
        assert_eq!(hb.tick(u32::MAX - 50), None);
        assert!(hb.tick(900).is_some());
    }

    #[test]
    fn sim_watchdog_keeps_timeout() {
        let wd = Watchdog::new(5_000);
        wd.feed();
        assert_eq!(wd.timeout_ms(), 5_000);
    }
}
