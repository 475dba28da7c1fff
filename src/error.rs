//! Unified error types for the controller firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop can log any failure the same way.  Nothing in here is fatal: the
//! worst outcome of any variant is a feature going inert.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent storage could not be read or written.
    Storage(StorageError),
    /// User input was rejected (editor save, out-of-range id).
    Validation(ValidationError),
    /// A pump run could not be started.
    Dose(DoseError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Dose(e) => write!(f, "dose: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::NotFound => Self::Config("no stored config"),
            ConfigError::StorageFull => Self::Storage(StorageError::Full),
            ConfigError::IoError => Self::Storage(StorageError::IoError),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Rejections raised while committing an editor draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The draft's day mask is empty.
    NoDaysSelected,
    /// The target schedule list is at capacity.
    ListFull,
}

impl ValidationError {
    /// Short on-screen notice text.
    pub const fn notice_text(self) -> &'static str {
        match self {
            Self::NoDaysSelected => "SELECT DAYS!",
            Self::ListFull => "LIST FULL!",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDaysSelected => write!(f, "no days selected"),
            Self::ListFull => write!(f, "schedule list full"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Dose errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseError {
    /// Another run holds the pump outputs.
    Busy,
    /// Pump id outside 1..=4.
    InvalidPump(u8),
    /// The pump's calibrated rate is zero or negative.
    NoFlowRate(u8),
    /// Requested volume is zero.
    ZeroAmount,
    /// The pump PWM channels failed to come up at boot.
    PumpsOffline,
}

impl DoseError {
    pub const fn notice_text(self) -> &'static str {
        match self {
            Self::Busy => "PUMP BUSY",
            Self::InvalidPump(_) => "BAD PUMP!",
            Self::NoFlowRate(_) => "CALIBRATE!",
            Self::ZeroAmount => "SET AMOUNT!",
            Self::PumpsOffline => "PUMP FAULT",
        }
    }
}

impl fmt::Display for DoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "pump outputs busy"),
            Self::InvalidPump(p) => write!(f, "invalid pump {p}"),
            Self::NoFlowRate(p) => write!(f, "pump {p} has no flow rate"),
            Self::ZeroAmount => write!(f, "zero amount"),
            Self::PumpsOffline => write!(f, "pump outputs offline"),
        }
    }
}

impl From<DoseError> for Error {
    fn from(e: DoseError) -> Self {
        Self::Dose(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(match e {
            HwInitError::GpioConfigFailed(_) => "gpio",
            HwInitError::LedcInitFailed(_) => "ledc",
            HwInitError::IsrInstallFailed(_) => "isr service",
        })
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_notice_texts() {
        assert_eq!(ValidationError::NoDaysSelected.notice_text(), "SELECT DAYS!");
        assert_eq!(ValidationError::ListFull.notice_text(), "LIST FULL!");
    }

    #[test]
    fn config_error_maps_into_firmware_error() {
        let e: Error = ConfigError::ValidationFailed("menu_timeout_ms").into();
        assert_eq!(e, Error::Config("menu_timeout_ms"));
        let e: Error = ConfigError::IoError.into();
        assert_eq!(e, Error::Storage(StorageError::IoError));
    }

    #[test]
    fn display_is_prefixed_by_subsystem() {
        let e = Error::from(DoseError::Busy);
        assert_eq!(format!("{e}"), "dose: pump outputs busy");
    }

    #[test]
    fn init_failure_names_the_peripheral() {
        let e = Error::from(HwInitError::LedcInitFailed(-1));
        assert_eq!(e, Error::Init("ledc"));
    }
}
