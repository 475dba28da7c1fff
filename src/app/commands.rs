//! Inbound commands to the application service.
//!
//! Menu strategies cannot reach the pumps or storage directly, so actions
//! that need a port are queued as an [`AppCommand`] in the menu effects and
//! carried out by the [`ControllerService`](super::service::ControllerService)
//! after dispatch.

use crate::config::SystemConfig;

/// Commands that the menu or external adapters send into the core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Run `pump` for `amount_dml` deci-millilitres.
    ManualDose { pump: u8, amount_dml: u16 },

    /// Run `pump` at its stored duty for its stored calibration time.
    CalibrationRun { pump: u8 },

    /// Erase the WiFi namespace and restart.
    ResetWifi,

    /// Erase every persisted namespace and restart.
    FactoryReset,

    /// Hot-reload configuration.
    UpdateConfig(SystemConfig),

    /// Explicitly persist the current config immediately.
    SaveConfig,
}
