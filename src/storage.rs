//! Record persistence over [`StoragePort`].
//!
//! Every record is postcard-encoded into a zero-padded [`RECORD_SIZE`]
//! buffer and written whole, so a load can reject blobs of any other
//! length (older layouts, truncation) before decoding.
//!
//! | Namespace   | Keys                                           |
//! |-------------|------------------------------------------------|
//! | `schedules` | `dose_count`, `outlet_count`, `dose_N`, `outlet_N` |
//! | `pumps`     | `cal_0` .. `cal_3`                              |
//! | `topup`     | `config`                                       |
//! | `replace`   | `config`                                       |
//!
//! Load failures are tolerated: the in-memory value keeps its prior or
//! default contents and a warning is logged.

use core::fmt::Write;

use heapless::String;
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{StorageError, StoragePort};
use crate::records::{AuxRecords, Calibrations, PumpCalibration};
use crate::schedule::{
    DayScheduled, MAX_DOSING_SCHEDULES, MAX_OUTLET_SCHEDULES, ScheduleList, ScheduleStore,
};

pub const NS_SCHEDULES: &str = "schedules";
pub const NS_PUMPS: &str = "pumps";
pub const NS_TOPUP: &str = "topup";
pub const NS_REPLACE: &str = "replace";
pub const NS_CONFIG: &str = "config";
pub const NS_WIFI: &str = "wifi";

/// Namespaces wiped by a factory reset.
pub const FACTORY_RESET_NAMESPACES: [&str; 5] =
    [NS_SCHEDULES, NS_PUMPS, NS_TOPUP, NS_REPLACE, NS_CONFIG];

/// Fixed on-flash size of every record blob.
pub const RECORD_SIZE: usize = 24;

const KEY_DOSE_COUNT: &str = "dose_count";
const KEY_OUTLET_COUNT: &str = "outlet_count";
const KEY_CONFIG: &str = "config";

type Key = String<16>;

fn indexed_key(prefix: &str, index: usize) -> Key {
    let mut key = Key::new();
    let _ = write!(key, "{prefix}_{index}");
    key
}

// ═══════════════════════════════════════════════════════════════════════════
//  Single records
// ═══════════════════════════════════════════════════════════════════════════

/// Encode `record` into a fixed-size blob and store it.
pub fn save_record<T: Serialize>(
    storage: &mut impl StoragePort,
    namespace: &str,
    key: &str,
    record: &T,
) -> Result<(), StorageError> {
    let mut buf = [0u8; RECORD_SIZE];
    postcard::to_slice(record, &mut buf).map_err(|_| StorageError::Corrupted)?;
    storage.write(namespace, key, &buf)
}

/// Load a fixed-size blob and decode it.  Any other stored length fails.
pub fn load_record<T: DeserializeOwned>(
    storage: &impl StoragePort,
    namespace: &str,
    key: &str,
) -> Result<T, StorageError> {
    let mut buf = [0u8; RECORD_SIZE + 1];
    let len = storage.read(namespace, key, &mut buf)?;
    if len != RECORD_SIZE {
        return Err(StorageError::SizeMismatch);
    }
    postcard::from_bytes(&buf[..RECORD_SIZE]).map_err(|_| StorageError::Corrupted)
}

fn save_count(
    storage: &mut impl StoragePort,
    key: &str,
    count: usize,
) -> Result<(), StorageError> {
    storage.write(NS_SCHEDULES, key, &[count as u8])
}

fn load_count(storage: &impl StoragePort, key: &str, max: usize) -> Result<usize, StorageError> {
    let mut buf = [0u8; 2];
    let len = storage.read(NS_SCHEDULES, key, &mut buf)?;
    if len != 1 {
        return Err(StorageError::SizeMismatch);
    }
    Ok(usize::from(buf[0]).min(max))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Schedules
// ═══════════════════════════════════════════════════════════════════════════

/// Persist both schedule lists: counts first, then each live slot.
pub fn save_schedules(
    storage: &mut impl StoragePort,
    store: &ScheduleStore,
) -> Result<(), StorageError> {
    save_list(storage, KEY_DOSE_COUNT, "dose", &store.dosing)?;
    save_list(storage, KEY_OUTLET_COUNT, "outlet", &store.outlets)?;
    info!(
        "storage: saved {} dosing / {} outlet schedules",
        store.dosing.len(),
        store.outlets.len()
    );
    Ok(())
}

fn save_list<T: DayScheduled + Serialize, const N: usize>(
    storage: &mut impl StoragePort,
    count_key: &str,
    prefix: &str,
    list: &ScheduleList<T, N>,
) -> Result<(), StorageError> {
    save_count(storage, count_key, list.len())?;
    for (i, record) in list.iter().enumerate() {
        save_record(storage, NS_SCHEDULES, &indexed_key(prefix, i), record)?;
    }
    Ok(())
}

/// Replace `store` with the persisted lists.  Unreadable slots are skipped.
pub fn load_schedules(storage: &impl StoragePort, store: &mut ScheduleStore) {
    load_list(storage, KEY_DOSE_COUNT, "dose", MAX_DOSING_SCHEDULES, &mut store.dosing);
    load_list(storage, KEY_OUTLET_COUNT, "outlet", MAX_OUTLET_SCHEDULES, &mut store.outlets);
    info!(
        "storage: loaded {} dosing / {} outlet schedules",
        store.dosing.len(),
        store.outlets.len()
    );
}

fn load_list<T: DayScheduled + DeserializeOwned, const N: usize>(
    storage: &impl StoragePort,
    count_key: &str,
    prefix: &str,
    max: usize,
    list: &mut ScheduleList<T, N>,
) {
    let count = match load_count(storage, count_key, max) {
        Ok(n) => n,
        Err(StorageError::NotFound) => return,
        Err(e) => {
            warn!("storage: {} unreadable ({}), keeping current list", count_key, e);
            return;
        }
    };
    list.clear();
    for i in 0..count {
        let key = indexed_key(prefix, i);
        match load_record::<T>(storage, NS_SCHEDULES, &key) {
            Ok(record) => {
                list.push_loaded(record);
            }
            Err(e) => warn!("storage: skipping {} ({})", key, e),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Calibration and auxiliary records
// ═══════════════════════════════════════════════════════════════════════════

/// Persist the calibration of one pump (1..=4).
pub fn save_calibration(
    storage: &mut impl StoragePort,
    pump: u8,
    cal: &PumpCalibration,
) -> Result<(), StorageError> {
    let slot = usize::from(pump.saturating_sub(1));
    save_record(storage, NS_PUMPS, &indexed_key("cal", slot), cal)
}

pub fn load_calibrations(storage: &impl StoragePort, cals: &mut Calibrations) {
    for (slot, cal) in cals.as_mut_slice().iter_mut().enumerate() {
        let key = indexed_key("cal", slot);
        match load_record::<PumpCalibration>(storage, NS_PUMPS, &key) {
            Ok(loaded) => *cal = loaded,
            Err(StorageError::NotFound) => {}
            Err(e) => warn!("storage: {} unreadable ({}), using defaults", key, e),
        }
    }
}

/// Load calibration, top-up, and replace records into `aux`.
pub fn load_aux(storage: &impl StoragePort, aux: &mut AuxRecords) {
    load_calibrations(storage, &mut aux.calibrations);
    load_into(storage, NS_TOPUP, &mut aux.top_up);
    load_into(storage, NS_REPLACE, &mut aux.replace);
}

fn load_into<T: DeserializeOwned>(storage: &impl StoragePort, namespace: &str, target: &mut T) {
    match load_record::<T>(storage, namespace, KEY_CONFIG) {
        Ok(loaded) => *target = loaded,
        Err(StorageError::NotFound) => {}
        Err(e) => warn!("storage: {}::config unreadable ({})", namespace, e),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Resets
// ═══════════════════════════════════════════════════════════════════════════

/// Wipe every namespace this firmware owns except WiFi credentials.
/// Keeps going past individual failures and reports the first one.
pub fn factory_reset(storage: &mut impl StoragePort) -> Result<(), StorageError> {
    let mut first_err = None;
    for ns in FACTORY_RESET_NAMESPACES {
        if let Err(e) = storage.erase_namespace(ns) {
            warn!("storage: erase {} failed ({})", ns, e);
            first_err.get_or_insert(e);
        }
    }
    info!("storage: factory reset complete");
    first_err.map_or(Ok(()), Err)
}

pub fn reset_wifi(storage: &mut impl StoragePort) -> Result<(), StorageError> {
    storage.erase_namespace(NS_WIFI)?;
    info!("storage: WiFi credentials erased");
    Ok(())
}
