//! Integration tests for the ControllerService → engines → actuators pipeline.
//!
//! Schedules are seeded through storage, exactly as they would be found
//! after a reboot, and the service is ticked against a scripted clock.

use super::mock_hw::{ActuatorCall, Bench, MockNvs, wall};

use hydrocontroller::app::commands::AppCommand;
use hydrocontroller::app::events::AppEvent;
use hydrocontroller::app::ports::{HardwareHealth, StoragePort};
use hydrocontroller::config::SystemConfig;
use hydrocontroller::days::DayMask;
use hydrocontroller::dosing::{DoseSource, DoseState};
use hydrocontroller::schedule::{DosingSchedule, OutletSchedule, ScheduleStore};
use hydrocontroller::storage::{self, NS_SCHEDULES, NS_WIFI};

const MONDAY: u8 = 1;

/// Storage holding one enabled 2.0 mL dose on pump 2, Mondays at 08:00.
fn nvs_with_monday_dose() -> MockNvs {
    let mut store = ScheduleStore::new();
    store
        .dosing
        .add(DosingSchedule {
            pump: 2,
            days: DayMask::from_bits(1 << MONDAY),
            hour: 8,
            minute: 0,
            amount_dml: 20,
            enabled: true,
            ..DosingSchedule::default()
        })
        .unwrap();
    let mut nvs = MockNvs::new();
    storage::save_schedules(&mut nvs, &store).unwrap();
    nvs
}

fn nvs_with_lights_on_relay_3() -> MockNvs {
    let mut store = ScheduleStore::new();
    store
        .outlets
        .add(OutletSchedule {
            relay: 3,
            days: DayMask::ALL,
            hour_on: 6,
            minute_on: 0,
            hour_off: 22,
            minute_off: 0,
            enabled: true,
            ..OutletSchedule::default()
        })
        .unwrap();
    let mut nvs = MockNvs::new();
    storage::save_schedules(&mut nvs, &store).unwrap();
    nvs
}

// ── Startup ──────────────────────────────────────────────────

#[test]
fn start_turns_outputs_off_and_reports_loaded_schedules() {
    let bench = Bench::with_nvs(nvs_with_monday_dose());

    assert_eq!(bench.hw.calls.first(), Some(&ActuatorCall::AllOff));
    assert_eq!(
        bench.sink.events.first(),
        Some(&AppEvent::Started {
            dosing: 1,
            outlets: 0
        })
    );
    assert_eq!(bench.app.schedules().dosing.get(0).map(|s| s.pump), Some(2));
}

#[test]
fn empty_storage_boots_with_no_schedules() {
    let mut bench = Bench::new();
    bench.tick();
    assert!(bench.app.schedules().dosing.is_empty());
    assert!(bench.app.schedules().outlets.is_empty());
    assert_eq!(bench.display.title(), "MAIN MENU");
}

// ── Scheduled dosing ─────────────────────────────────────────

#[test]
fn scheduled_dose_runs_for_calibrated_duration() {
    let mut bench = Bench::with_nvs(nvs_with_monday_dose());
    bench.set_wall(Some(wall(MONDAY, 8, 0)));

    // First tick at 50 ms starts the run: 2.0 mL at 1.0 mL/s = 2000 ms.
    bench.tick();
    assert_eq!(bench.hw.pump_duty(2), 50);
    assert!(bench.sink.events.contains(&AppEvent::DoseStarted {
        pump: 2,
        duration_ms: 2_000,
        source: DoseSource::Schedule(0),
    }));

    bench.run_for(1_900);
    assert_eq!(bench.app.dosing().state(), DoseState::Running);
    assert_eq!(bench.hw.pump_duty(2), 50);

    bench.run_for(100);
    assert_eq!(bench.hw.pump_duty(2), 0);
    assert!(bench.sink.events.contains(&AppEvent::DoseCompleted {
        pump: 2,
        source: DoseSource::Schedule(0),
    }));
}

#[test]
fn scheduled_dose_fires_once_per_matching_minute() {
    let mut bench = Bench::with_nvs(nvs_with_monday_dose());
    bench.set_wall(Some(wall(MONDAY, 8, 0)));

    // Still 08:00 for the whole window; the cooldown holds the second run.
    bench.run_for(10_000);
    assert_eq!(bench.hw.pump_starts(), vec![(2, 50)]);
}

#[test]
fn scheduled_dose_skips_other_days_and_unset_clock() {
    let mut bench = Bench::with_nvs(nvs_with_monday_dose());

    bench.run_for(2_000);
    bench.set_wall(Some(wall(MONDAY + 1, 8, 0)));
    bench.run_for(2_000);
    bench.set_wall(Some(wall(MONDAY, 8, 1)));
    bench.run_for(2_000);

    assert!(bench.hw.pump_starts().is_empty());
    assert_eq!(
        bench
            .sink
            .count(|e| matches!(e, AppEvent::DoseStarted { .. })),
        0
    );
}

// ── Manual dosing ────────────────────────────────────────────

#[test]
fn manual_dose_runs_and_stops() {
    let mut bench = Bench::new();
    bench.tick();

    bench.app.handle_command(
        AppCommand::ManualDose {
            pump: 4,
            amount_dml: 5,
        },
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );
    assert_eq!(bench.hw.pump_duty(4), 50);
    assert!(bench.app.dosing().is_busy());

    bench.run_for(500);
    assert_eq!(bench.hw.pump_duty(4), 0);
    assert!(bench.sink.events.contains(&AppEvent::DoseCompleted {
        pump: 4,
        source: DoseSource::Manual,
    }));
}

#[test]
fn pumps_accept_a_new_dose_right_after_one_completes() {
    let mut bench = Bench::new();
    bench.tick();

    let dose = |pump| AppCommand::ManualDose {
        pump,
        amount_dml: 5,
    };
    bench
        .app
        .handle_command(dose(1), &mut bench.hw, &mut bench.nvs, &mut bench.sink);
    bench.run_for(500);
    assert_eq!(bench.hw.pump_duty(1), 0);
    assert!(!bench.app.dosing().is_busy());

    bench
        .app
        .handle_command(dose(2), &mut bench.hw, &mut bench.nvs, &mut bench.sink);
    assert_eq!(bench.hw.pump_duty(2), 50);
    assert_eq!(bench.hw.pump_starts(), vec![(1, 50), (2, 50)]);
}

#[test]
fn manual_dose_refused_while_scheduled_run_active() {
    let mut bench = Bench::with_nvs(nvs_with_monday_dose());
    bench.set_wall(Some(wall(MONDAY, 8, 0)));
    bench.tick();
    assert!(bench.app.dosing().is_busy());

    bench.app.handle_command(
        AppCommand::ManualDose {
            pump: 1,
            amount_dml: 10,
        },
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );

    assert_eq!(bench.hw.pump_duty(1), 0);
    let notice = bench.app.menu().ctx.notice.as_ref().map(|n| n.text.as_str());
    assert_eq!(notice, Some("PUMP BUSY"));
    assert_eq!(bench.hw.pump_starts(), vec![(2, 50)]);
}

// ── Outlets ──────────────────────────────────────────────────

#[test]
fn outlet_window_switches_relay() {
    let mut bench = Bench::with_nvs(nvs_with_lights_on_relay_3());
    bench.set_wall(Some(wall(MONDAY, 12, 0)));

    bench.tick();
    assert!(bench.hw.relay_on(3));
    assert!(bench.app.outlets().relay_state(3));
    assert!(!bench.hw.relay_on(1));

    bench.set_wall(Some(wall(MONDAY, 22, 0)));
    bench.run_for(1_000);
    assert!(!bench.hw.relay_on(3));

    let changes: Vec<_> = bench
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::OutletChanged { .. }))
        .cloned()
        .collect();
    assert_eq!(
        changes,
        vec![
            AppEvent::OutletChanged { relay: 3, on: true },
            AppEvent::OutletChanged {
                relay: 3,
                on: false
            },
        ]
    );
}

#[test]
fn outlets_stay_off_without_wall_clock() {
    let mut bench = Bench::with_nvs(nvs_with_lights_on_relay_3());
    bench.run_for(3_000);
    assert!(!bench.hw.relay_on(3));
}

// ── Degraded boot ────────────────────────────────────────────

#[test]
fn pump_init_failure_leaves_outlets_and_menu_running() {
    let mut nvs = nvs_with_lights_on_relay_3();
    let mut doses = ScheduleStore::new();
    storage::load_schedules(&nvs, &mut doses);
    doses
        .dosing
        .add(DosingSchedule {
            pump: 2,
            days: DayMask::ALL,
            hour: 12,
            minute: 0,
            enabled: true,
            ..DosingSchedule::default()
        })
        .unwrap();
    storage::save_schedules(&mut nvs, &doses).unwrap();

    let mut bench = Bench::with_nvs(nvs);
    bench.app.set_hardware_health(HardwareHealth {
        pumps: false,
        ..HardwareHealth::ALL_UP
    });
    bench.set_wall(Some(wall(MONDAY, 12, 0)));
    bench.run_for(2_000);

    assert!(bench.hw.relay_on(3));
    assert!(bench.hw.pump_starts().is_empty());
    assert!(bench.display.find("HW!").is_some());

    bench.app.handle_command(
        AppCommand::ManualDose {
            pump: 1,
            amount_dml: 10,
        },
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );
    let notice = bench.app.menu().ctx.notice.as_ref().map(|n| n.text.as_str());
    assert_eq!(notice, Some("PUMP FAULT"));
    assert!(bench.hw.pump_starts().is_empty());
}

// ── Resets ───────────────────────────────────────────────────

#[test]
fn factory_reset_erases_records_but_keeps_wifi() {
    let mut nvs = nvs_with_monday_dose();
    nvs.write(NS_WIFI, "ssid", b"greenhouse").unwrap();
    let mut bench = Bench::with_nvs(nvs);
    bench.tick();

    bench.app.handle_command(
        AppCommand::FactoryReset,
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );

    assert!(bench.app.restart_requested());
    assert!(bench.app.schedules().dosing.is_empty());
    assert_eq!(bench.nvs.key_count(NS_SCHEDULES), 0);
    assert!(bench.nvs.exists(NS_WIFI, "ssid"));
    assert_eq!(bench.hw.last_call(), Some(&ActuatorCall::AllOff));
    assert!(
        bench
            .sink
            .events
            .contains(&AppEvent::ResetPerformed { factory: true })
    );
}

#[test]
fn wifi_reset_keeps_schedules() {
    let mut nvs = nvs_with_monday_dose();
    nvs.write(NS_WIFI, "ssid", b"greenhouse").unwrap();
    let mut bench = Bench::with_nvs(nvs);

    bench.app.handle_command(
        AppCommand::ResetWifi,
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );

    assert!(bench.app.restart_requested());
    assert!(!bench.nvs.exists(NS_WIFI, "ssid"));
    assert_eq!(bench.app.schedules().dosing.len(), 1);
    assert!(bench.nvs.key_count(NS_SCHEDULES) > 0);
}

// ── Config lifecycle ─────────────────────────────────────────

#[test]
fn config_update_auto_saves_after_delay() {
    let mut bench = Bench::new();
    bench.tick();

    let cfg = SystemConfig {
        menu_timeout_ms: 45_000,
        ..SystemConfig::default()
    };
    bench.app.handle_command(
        AppCommand::UpdateConfig(cfg),
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );
    assert!(bench.app.is_config_dirty());
    assert!(!bench.app.auto_save_if_needed(&bench.nvs));

    bench.run_for(5_000);
    assert!(bench.app.auto_save_if_needed(&bench.nvs));
    assert!(!bench.app.is_config_dirty());
    assert_eq!(bench.nvs.saved_timeout(), Some(45_000));
}

#[test]
fn failed_config_save_stays_dirty() {
    let mut bench = Bench::new();
    bench.nvs.fail_writes = true;
    bench.tick();

    bench.app.handle_command(
        AppCommand::SaveConfig,
        &mut bench.hw,
        &mut bench.nvs,
        &mut bench.sink,
    );
    assert!(!bench.app.auto_save_if_needed(&bench.nvs));
    assert!(bench.app.is_config_dirty());
}
