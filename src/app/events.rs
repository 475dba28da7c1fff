//! Outbound application events.
//!
//! The [`ControllerService`](super::service::ControllerService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (log to serial, publish over
//! MQTT, etc).

use crate::dosing::DoseSource;
use crate::menu::MenuId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started with this many stored schedules.
    Started { dosing: usize, outlets: usize },

    /// The menu changed screens.
    MenuChanged { from: MenuId, to: MenuId },

    /// The menu returned home after inactivity.
    IdleTimeout,

    /// The schedule store was written to storage.
    SchedulesSaved { dosing: usize, outlets: usize },

    /// A pump run began.
    DoseStarted {
        pump: u8,
        duration_ms: u32,
        source: DoseSource,
    },

    /// A pump run finished and the pump was stopped.
    DoseCompleted { pump: u8, source: DoseSource },

    /// A relay changed state.
    OutletChanged { relay: u8, on: bool },

    /// Persisted state was erased; a restart is pending.
    ResetPerformed { factory: bool },
}
