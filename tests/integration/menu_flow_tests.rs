//! Encoder-driven menu flows, end to end.
//!
//! Every step goes through the same path as a user at the panel: turn the
//! encoder, press or hold the switch, let the service tick.

use super::mock_hw::{ActuatorCall, Bench, MockNvs, wall};

use hydrocontroller::app::events::AppEvent;
use hydrocontroller::app::ports::StoragePort;
use hydrocontroller::days::DayMask;
use hydrocontroller::dosing::DoseSource;
use hydrocontroller::menu::{CONFIRM_YES, MenuId};
use hydrocontroller::schedule::{DosingSchedule, ScheduleStore};
use hydrocontroller::storage::{self, NS_SCHEDULES, NS_WIFI};

/// Main → Scheduling → Dosing Schedule → Add Schedule.
fn open_dosing_editor(bench: &mut Bench) {
    bench.tick();
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::Scheduling);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingSchedule);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingAdd);
    assert_eq!(bench.display.title(), "ADD DOSING");
}

#[test]
fn add_dosing_schedule_through_encoder_persists_it() {
    let mut bench = Bench::new();
    open_dosing_editor(&mut bench);

    // Pump field: enter edit, one detent up, leave edit.
    bench.press();
    bench.turn_to(1);
    bench.press();
    assert_eq!(bench.input.position, 0, "leaving edit parks the encoder on the field");

    // Days field opens the picker.
    bench.turn_to(1);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingSelectDays);
    assert_eq!(bench.display.title(), "SELECT DAYS");

    bench.turn_to(1);
    bench.press(); // Monday
    bench.turn_to(3);
    bench.press(); // Wednesday
    assert!(bench.display.find("[x] Monday").is_some());
    assert!(bench.display.find("[x] Wednesday").is_some());

    // Four detents back from Wednesday wraps onto Done.
    bench.turn_to(-1);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingAdd);

    bench.turn_to(4);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingSchedule);
    assert_eq!(bench.display.notice(), Some("SAVED!"));

    let saved = *bench.app.schedules().dosing.get(0).unwrap();
    assert_eq!(saved.pump, 2);
    assert_eq!(saved.days.bits(), 0b0000_1010);
    assert_eq!((saved.hour, saved.minute, saved.amount_dml), (8, 0, 10));
    assert!(saved.enabled);

    assert!(bench.sink.events.contains(&AppEvent::SchedulesSaved {
        dosing: 1,
        outlets: 0
    }));
    let mut reloaded = ScheduleStore::new();
    storage::load_schedules(&bench.nvs, &mut reloaded);
    assert_eq!(reloaded.dosing.get(0), Some(&saved));
}

#[test]
fn saving_without_days_is_refused() {
    let mut bench = Bench::new();
    open_dosing_editor(&mut bench);

    bench.turn_to(4);
    bench.press();

    assert_eq!(bench.app.current_menu(), MenuId::DosingAdd);
    assert_eq!(bench.display.notice(), Some("SELECT DAYS!"));
    assert!(bench.app.schedules().dosing.is_empty());
    assert_eq!(bench.nvs.key_count(NS_SCHEDULES), 0);
}

#[test]
fn storage_failure_keeps_schedule_in_memory() {
    let mut nvs = MockNvs::new();
    nvs.fail_writes = true;
    let mut bench = Bench::with_nvs(nvs);
    open_dosing_editor(&mut bench);

    bench.turn_to(1);
    bench.hold(); // picker via long press
    bench.press(); // Sunday
    bench.hold(); // back to the editor, keeping the toggle
    bench.turn_to(4);
    bench.press();

    assert_eq!(bench.app.schedules().dosing.len(), 1);
    assert_eq!(
        bench
            .sink
            .count(|e| matches!(e, AppEvent::SchedulesSaved { .. })),
        0
    );
}

#[test]
fn long_press_backs_out_one_level() {
    let mut bench = Bench::new();
    bench.tick();
    bench.press();
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingSchedule);

    bench.hold();
    assert_eq!(bench.app.current_menu(), MenuId::Scheduling);
    bench.hold();
    assert_eq!(bench.app.current_menu(), MenuId::Main);
}

#[test]
fn idle_menu_returns_home() {
    let mut bench = Bench::new();
    bench.tick();
    bench.press();
    bench.turn_to(1);
    assert_eq!(bench.app.current_menu(), MenuId::Scheduling);

    bench.run_for(29_900);
    assert_eq!(bench.app.current_menu(), MenuId::Scheduling);

    bench.run_for(200);
    assert_eq!(bench.app.current_menu(), MenuId::Main);
    assert!(bench.sink.events.contains(&AppEvent::IdleTimeout));
    assert_eq!(bench.input.position, 0);
}

#[test]
fn encoder_motion_counts_as_activity() {
    let mut bench = Bench::new();
    bench.tick();
    bench.press();

    bench.run_for(20_000);
    bench.turn_to(1);
    bench.run_for(20_000);
    assert_eq!(bench.app.current_menu(), MenuId::Scheduling);
}

#[test]
fn manual_dose_from_menu_is_refused_while_busy() {
    let mut bench = Bench::new();
    bench.tick();

    // Main item 1 is Manual Dosing; Start sits at index 2.
    bench.turn_to(1);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::ManualDosing);
    bench.turn_to(2);
    bench.press();
    assert_eq!(bench.hw.pump_duty(1), 50);

    bench.press();
    assert_eq!(bench.display.notice(), Some("PUMP BUSY"));
    assert_eq!(bench.hw.pump_starts().len(), 1);
}

#[test]
fn factory_reset_confirmation_from_menu() {
    let mut nvs = MockNvs::new();
    nvs.write(NS_WIFI, "ssid", b"greenhouse").unwrap();
    let mut bench = Bench::with_nvs(nvs);
    bench.tick();

    bench.turn_to(6);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::FactoryResetConfirm);

    // The dialog opens on No; pressing it returns without resetting.
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::Main);
    assert!(!bench.app.restart_requested());

    bench.turn_to(6);
    bench.press();
    bench.turn_to(0);
    bench.press();

    assert!(bench.app.restart_requested());
    assert_eq!(bench.app.current_menu(), MenuId::Main);
    assert!(bench.nvs.exists(NS_WIFI, "ssid"));
    assert!(bench.hw.calls.contains(&ActuatorCall::AllOff));
}

#[test]
fn deleting_a_fired_schedule_does_not_mute_its_successor() {
    let monday = |pump, minute| DosingSchedule {
        pump,
        days: DayMask::from_bits(0b10),
        hour: 8,
        minute,
        amount_dml: 10,
        enabled: true,
        ..DosingSchedule::default()
    };
    let mut store = ScheduleStore::new();
    store.dosing.add(monday(1, 0)).unwrap();
    store.dosing.add(monday(3, 1)).unwrap();
    let mut nvs = MockNvs::new();
    storage::save_schedules(&mut nvs, &store).unwrap();
    let mut bench = Bench::with_nvs(nvs);

    bench.set_wall(Some(wall(1, 8, 0)));
    bench.tick();
    bench.run_for(1_000);
    assert_eq!(bench.hw.pump_starts(), vec![(1, 50)]);

    // Scheduling → Dosing Schedule → Delete Schedule → first entry → Yes.
    bench.press();
    bench.press();
    bench.turn_to(2);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingDelete);
    bench.press();
    assert_eq!(bench.app.current_menu(), MenuId::DosingDeleteConfirm);
    bench.turn_to(CONFIRM_YES);
    bench.press();
    assert_eq!(bench.display.notice(), Some("DELETED!"));
    assert_eq!(bench.app.schedules().dosing.get(0).map(|s| s.pump), Some(3));

    // Well inside the cooldown window of the deleted entry.
    bench.set_wall(Some(wall(1, 8, 1)));
    bench.run_for(1_000);
    assert_eq!(bench.hw.pump_starts(), vec![(1, 50), (3, 50)]);
    assert!(bench.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::DoseStarted {
            pump: 3,
            source: DoseSource::Schedule(0),
            ..
        }
    )));
}
