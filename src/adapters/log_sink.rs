//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  An MQTT adapter
//! would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::dosing::DoseSource;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn source_tag(source: &DoseSource) -> heapless::String<16> {
    use core::fmt::Write as _;
    let mut s = heapless::String::new();
    let _ = match source {
        DoseSource::Schedule(slot) => write!(s, "schedule#{}", slot),
        DoseSource::Manual => s.push_str("manual").map_err(|_| core::fmt::Error),
        DoseSource::Calibration => s.push_str("calibration").map_err(|_| core::fmt::Error),
    };
    s
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { dosing, outlets } => {
                info!("START | dosing_schedules={} outlet_schedules={}", dosing, outlets);
            }
            AppEvent::MenuChanged { from, to } => {
                info!("MENU  | {:?} -> {:?}", from, to);
            }
            AppEvent::IdleTimeout => {
                info!("MENU  | idle timeout, back to main");
            }
            AppEvent::SchedulesSaved { dosing, outlets } => {
                info!("STORE | schedules saved (dosing={} outlets={})", dosing, outlets);
            }
            AppEvent::DoseStarted { pump, duration_ms, source } => {
                info!(
                    "DOSE  | pump {} start | {} ms | {}",
                    pump,
                    duration_ms,
                    source_tag(source)
                );
            }
            AppEvent::DoseCompleted { pump, source } => {
                info!("DOSE  | pump {} done | {}", pump, source_tag(source));
            }
            AppEvent::OutletChanged { relay, on } => {
                info!("RELAY | {} {}", relay, if *on { "ON" } else { "OFF" });
            }
            AppEvent::ResetPerformed { factory } => {
                info!(
                    "RESET | {} reset, restart pending",
                    if *factory { "factory" } else { "wifi" }
                );
            }
        }
    }
}
