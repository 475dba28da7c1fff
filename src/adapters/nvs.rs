//! Flash-backed key/blob storage and the persisted system config.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the controller.
//!
//! - Config validation: every tunable is range-checked before persistence.
//! - Namespace isolation: schedules, calibrations, auxiliary records, and
//!   config each live in their own namespace.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!
//! On the host the backend is an in-memory map keyed `"{ns}::{key}"`.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::storage::NS_CONFIG;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_KEY: &str = "syscfg";

/// NVS namespace and key names are limited to 15 bytes plus NUL.
#[cfg(target_os = "espidf")]
const NVS_NAME_MAX: usize = 15;

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Bring up the NVS partition.  A partition that is full or was
    /// written by a newer IDF is wiped and formatted again; anything else
    /// that fails is `ConfigError::IoError`.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the single main-task context before any
            // other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("nvs: partition unusable, formatting");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("nvs: flash partition ready");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("nvs: in-memory backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn map_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }

    /// NUL-terminated copy of an NVS name, truncated to the NVS limit.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
        let mut buf = [0u8; NVS_NAME_MAX + 1];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NVS_NAME_MAX);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, esp_err_t>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        // SAFETY: handle was opened above and is not used afterwards.
        unsafe { nvs_close(handle) };
        result
    }

    /// Commit after a mutating call on `handle`.
    #[cfg(target_os = "espidf")]
    fn commit(handle: nvs_handle_t, ret: esp_err_t) -> Result<(), esp_err_t> {
        if ret != ESP_OK {
            return Err(ret);
        }
        // SAFETY: handle is open in read/write mode.
        let ret = unsafe { nvs_commit(handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(())
    }
}

pub(crate) fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(5_000..=600_000).contains(&cfg.menu_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "menu_timeout_ms must be 5000–600000",
        ));
    }
    if !(10..=1_000).contains(&cfg.display_tick_ms) {
        return Err(ConfigError::ValidationFailed(
            "display_tick_ms must be 10–1000",
        ));
    }
    if !(100..=10_000).contains(&cfg.notice_duration_ms) {
        return Err(ConfigError::ValidationFailed(
            "notice_duration_ms must be 100–10000",
        ));
    }
    if cfg.notice_duration_ms >= cfg.menu_timeout_ms {
        return Err(ConfigError::ValidationFailed(
            "notice_duration_ms must be < menu_timeout_ms",
        ));
    }
    if !(100..=30_000).contains(&cfg.dosing_scan_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "dosing_scan_interval_ms must be 100–30000",
        ));
    }
    // A cooldown shorter than one minute would let a schedule fire twice
    // inside the minute it matches.
    if !(60_000..=3_600_000).contains(&cfg.dosing_cooldown_ms) {
        return Err(ConfigError::ValidationFailed(
            "dosing_cooldown_ms must be 60000–3600000",
        ));
    }
    if !(10..=1_000).contains(&cfg.button_debounce_ms) {
        return Err(ConfigError::ValidationFailed(
            "button_debounce_ms must be 10–1000",
        ));
    }
    if !(300..=10_000).contains(&cfg.long_press_ms) {
        return Err(ConfigError::ValidationFailed(
            "long_press_ms must be 300–10000",
        ));
    }
    if cfg.button_debounce_ms >= cfg.long_press_ms {
        return Err(ConfigError::ValidationFailed(
            "button_debounce_ms must be < long_press_ms",
        ));
    }
    if !(100..=10_000).contains(&cfg.heartbeat_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "heartbeat_interval_ms must be 100–10000",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; 128];
        match self.read(NS_CONFIG, CONFIG_KEY, &mut buf) {
            Ok(len) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                validate_config(&cfg)?;
                info!("nvs: config loaded, {} bytes", len);
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("nvs: first boot, default config");
                Ok(SystemConfig::default())
            }
            Err(StorageError::SizeMismatch) => Err(ConfigError::Corrupted),
            Err(_) => Err(ConfigError::IoError),
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::map_key(NS_CONFIG, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("nvs: config stored in memory");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(NS_CONFIG, true, |handle| {
                // SAFETY: key and data pointers are valid for the call.
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
                };
                Self::commit(handle, ret)
            });
            match result {
                Ok(()) => {
                    info!("nvs: config written, {} bytes", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(ConfigError::StorageFull),
                Err(e) => {
                    warn!("nvs: config write failed, esp_err {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let slot = Self::map_key(namespace, key);
            match self.store.borrow().get(&slot) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len().min(MAX_BLOB_SIZE);
                // SAFETY: `size` never exceeds the destination buffer.
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::SizeMismatch),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let slot = Self::map_key(namespace, key);
            self.store.borrow_mut().insert(slot, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                // SAFETY: key and data pointers are valid for the call.
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
                };
                Self::commit(handle, ret)
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let slot = Self::map_key(namespace, key);
            self.store.borrow_mut().remove(&slot);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                // SAFETY: key is NUL-terminated.
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr().cast()) };
                let ret = if ret == ESP_ERR_NVS_NOT_FOUND { ESP_OK as esp_err_t } else { ret };
                Self::commit(handle, ret)
            });
            match result {
                // The namespace itself never existed.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(()),
                other => other.map_err(|_| StorageError::IoError),
            }
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let slot = Self::map_key(namespace, key);
            self.store.borrow().contains_key(&slot)
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                // SAFETY: key is NUL-terminated; the type out-pointer is optional.
                let ret = unsafe {
                    nvs_find_key(handle, key.as_ptr().cast(), core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }

    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let prefix = Self::map_key(namespace, "");
            self.store
                .borrow_mut()
                .retain(|k: &String, _: &mut Vec<u8>| !k.starts_with(&prefix));
            info!("NvsAdapter: erased namespace '{}' (simulation)", namespace);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                // SAFETY: handle is open in read/write mode.
                let ret = unsafe { nvs_erase_all(handle) };
                Self::commit(handle, ret)
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: erased namespace '{}'", namespace);
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(()),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }
}
