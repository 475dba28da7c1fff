//! ESP32 clock adapter.
//!
//! Implements [`ClockPort`]:
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`,
//!   wall clock from the system time (`gettimeofday` + `localtime_r`),
//!   which the RTC or SNTP keeps set.
//! - **`not(target_os = "espidf")`**: uptime from `std::time::Instant`;
//!   the wall clock is whatever the simulation pinned with
//!   [`Esp32Clock::set_wall_clock`], `None` by default.

use crate::app::ports::{ClockPort, WallClock};

/// Anything earlier is an unset RTC (2020-01-01T00:00:00Z).
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Build a [`WallClock`] from `struct tm` style fields, rejecting
/// out-of-range values and dates before 2020.
///
/// `tm_year` counts from 1900, `tm_mon` from 0, `tm_wday` from Sunday.
pub fn from_tm_fields(
    tm_year: i32,
    tm_mon: i32,
    tm_mday: i32,
    tm_wday: i32,
    tm_hour: i32,
    tm_min: i32,
    tm_sec: i32,
) -> Option<WallClock> {
    let year = tm_year.checked_add(1900)?;
    if year < 2020
        || !(0..12).contains(&tm_mon)
        || !(1..=31).contains(&tm_mday)
        || !(0..7).contains(&tm_wday)
        || !(0..24).contains(&tm_hour)
        || !(0..60).contains(&tm_min)
        // tm_sec may be 60 on a leap second.
        || !(0..=60).contains(&tm_sec)
    {
        return None;
    }
    Some(WallClock {
        year: u16::try_from(year).ok()?,
        month: (tm_mon + 1) as u8,
        day: tm_mday as u8,
        weekday: tm_wday as u8,
        hour: tm_hour as u8,
        minute: tm_min as u8,
        second: tm_sec.min(59) as u8,
    })
}

pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    pinned: Option<WallClock>,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            pinned: None,
        }
    }

    /// Pin the simulated wall clock.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_wall_clock(&mut self, now: Option<WallClock>) {
        self.pinned = now;
    }
}

impl ClockPort for Esp32Clock {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u32 {
        // SAFETY: esp_timer_get_time is a monotonic counter read.
        ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1_000) as u32
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    #[cfg(target_os = "espidf")]
    fn wall_clock(&self) -> Option<WallClock> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: tv is a valid out-pointer; the timezone argument may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        // SAFETY: `tm` is plain old data; localtime_r fills it completely.
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        from_tm_fields(
            tm.tm_year, tm.tm_mon, tm.tm_mday, tm.tm_wday, tm.tm_hour, tm.tm_min, tm.tm_sec,
        )
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_clock(&self) -> Option<WallClock> {
        self.pinned
    }
}
