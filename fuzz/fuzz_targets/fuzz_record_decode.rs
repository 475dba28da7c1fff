//! Fuzz target: schedule, calibration, and auxiliary record decoding
//!
//! Stores arbitrary bytes under every key the loaders read and verifies:
//! - No panics under any byte sequence
//! - Loaded lists never exceed their capacity
//! - Loaded calibrations keep the per-pump table size
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use hydrocontroller::adapters::nvs::NvsAdapter;
use hydrocontroller::app::ports::StoragePort;
use hydrocontroller::records::AuxRecords;
use hydrocontroller::schedule::{MAX_DOSING_SCHEDULES, MAX_OUTLET_SCHEDULES, ScheduleStore};
use hydrocontroller::storage::{self, NS_PUMPS, NS_REPLACE, NS_SCHEDULES, NS_TOPUP};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };

    // First two bytes are the stored counts; the rest is sliced into blobs.
    let (counts, blobs) = data.split_at(data.len().min(2));
    for (key, count) in ["dose_count", "outlet_count"].iter().zip(counts) {
        let _ = nvs.write(NS_SCHEDULES, key, &[*count]);
    }
    for (i, chunk) in blobs.chunks(storage::RECORD_SIZE).enumerate().take(8) {
        let _ = nvs.write(NS_SCHEDULES, &format!("dose_{i}"), chunk);
        let _ = nvs.write(NS_SCHEDULES, &format!("outlet_{i}"), chunk);
        let _ = nvs.write(NS_PUMPS, &format!("cal_{}", i % 4), chunk);
        let _ = nvs.write(if i % 2 == 0 { NS_TOPUP } else { NS_REPLACE }, "config", chunk);
    }

    let mut store = ScheduleStore::new();
    storage::load_schedules(&nvs, &mut store);
    assert!(store.dosing.len() <= MAX_DOSING_SCHEDULES);
    assert!(store.outlets.len() <= MAX_OUTLET_SCHEDULES);

    let mut aux = AuxRecords::default();
    storage::load_aux(&nvs, &mut aux);
    assert_eq!(aux.calibrations.as_slice().len(), 4);
});
