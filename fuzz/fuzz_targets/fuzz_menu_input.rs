//! Fuzz target: menu engine under arbitrary encoder input
//!
//! Each fuzz byte is one control tick: the low bits pick an encoder step,
//! the high bits a press or long press.  Verifies:
//! - No panics in any strategy, editor, or picker
//! - Pump duties never exceed 100 %
//! - An idle period always lands back on the main menu
//!
//! cargo fuzz run fuzz_menu_input

#![no_main]

use hydrocontroller::adapters::display::TextDisplay;
use hydrocontroller::adapters::log_sink::LogEventSink;
use hydrocontroller::adapters::nvs::NvsAdapter;
use hydrocontroller::app::ports::{ActuatorPort, ClockPort, InputPort, WallClock};
use hydrocontroller::app::service::ControllerService;
use hydrocontroller::config::SystemConfig;
use hydrocontroller::menu::MenuId;
use libfuzzer_sys::fuzz_target;

struct FuzzClock {
    now_ms: u32,
}

impl ClockPort for FuzzClock {
    fn uptime_ms(&self) -> u32 {
        self.now_ms
    }

    fn wall_clock(&self) -> Option<WallClock> {
        Some(WallClock {
            year: 2026,
            month: 10,
            day: 15,
            weekday: 4,
            hour: 8,
            minute: 0,
            second: 0,
        })
    }
}

#[derive(Default)]
struct FuzzInput {
    position: i32,
    press: bool,
    long_press: bool,
}

impl InputPort for FuzzInput {
    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    fn take_press(&mut self) -> bool {
        std::mem::take(&mut self.press)
    }

    fn take_long_press(&mut self) -> bool {
        std::mem::take(&mut self.long_press)
    }
}

#[derive(Default)]
struct DutyCheck;

impl ActuatorPort for DutyCheck {
    fn set_pump(&mut self, _pump: u8, duty: u8) {
        assert!(duty <= 100);
    }

    fn set_relay(&mut self, _relay: u8, _on: bool) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    let config = SystemConfig::default();
    let timeout = config.menu_timeout_ms;
    let mut app = ControllerService::load(config, &nvs);
    let mut clock = FuzzClock { now_ms: 0 };
    let mut input = FuzzInput::default();
    let mut display = TextDisplay::new();
    let mut hw = DutyCheck;
    let mut sink = LogEventSink::new();
    app.start(&mut hw, &mut sink);

    for &b in data.iter().take(512) {
        let step = i32::from(b & 0x0F) - 8;
        input.position = input.position.saturating_add(step);
        input.press = b & 0x30 == 0x10;
        input.long_press = b & 0x30 == 0x20;
        clock.now_ms += 50;
        app.tick(&clock, &mut input, &mut display, &mut hw, &mut nvs, &mut sink);
        if app.restart_requested() {
            return;
        }
    }

    clock.now_ms += timeout + 100;
    app.tick(&clock, &mut input, &mut display, &mut hw, &mut nvs, &mut sink);
    assert_eq!(app.current_menu(), MenuId::Main);
});
