//! Hydroponics Controller Firmware: main entry point
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EncoderInput   TextDisplay   HardwareAdapter   NvsAdapter     │
//! │  (InputPort)    (RenderPort)  (ActuatorPort)    (Config+NVS)   │
//! │  Esp32Clock     LogEventSink                                   │
//! │  (ClockPort)    (EventSink)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ControllerService (pure logic)              │    │
//! │  │  Menu engine · Dosing engine · Outlet engine           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Encoder ISR ──▶ atomics ──▶ EncoderInput (once per tick)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use hydrocontroller::adapters::display::TextDisplay;
use hydrocontroller::adapters::hardware::HardwareAdapter;
use hydrocontroller::adapters::input::EncoderInput;
use hydrocontroller::adapters::log_sink::LogEventSink;
use hydrocontroller::adapters::nvs::NvsAdapter;
use hydrocontroller::adapters::time::Esp32Clock;
use hydrocontroller::app::ports::{ActuatorPort, ClockPort, ConfigPort};
use hydrocontroller::app::service::ControllerService;
use hydrocontroller::config::SystemConfig;
use hydrocontroller::drivers::button::ButtonDriver;
use hydrocontroller::drivers::hw_init;
use hydrocontroller::drivers::watchdog::{DEFAULT_TIMEOUT_MS, Heartbeat, Watchdog};

/// Time between `all_off` and the reboot so relays settle.
const RESTART_DELAY_MS: u32 = 500;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Hydro Controller v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    let health = hw_init::bring_up();
    if health.is_degraded() {
        error!("Hardware init incomplete ({:?}); continuing degraded", health);
    }
    let watchdog = Watchdog::new(DEFAULT_TIMEOUT_MS);

    // ── 3. Storage and config ─────────────────────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Adapters ───────────────────────────────────────────
    let clock = Esp32Clock::new();
    let mut input = EncoderInput::new(ButtonDriver::new(
        config.button_debounce_ms,
        config.long_press_ms,
    ));
    let mut display = TextDisplay::new();
    let mut hw = HardwareAdapter::new();
    let mut log_sink = LogEventSink::new();
    let mut heartbeat = Heartbeat::new(config.heartbeat_interval_ms);

    if clock.wall_clock().is_none() {
        warn!("RTC not set; schedules stay inert until the clock is valid");
    }

    // ── 5. App service ────────────────────────────────────────
    let mut app = ControllerService::load(config, &nvs);
    app.set_hardware_health(health);
    app.start(&mut hw, &mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let cfg = app.current_config();
        let now = clock.uptime_ms();

        input
            .button_mut()
            .set_timing(cfg.button_debounce_ms, cfg.long_press_ms);
        input.poll(now);

        app.tick(&clock, &mut input, &mut display, &mut hw, &mut nvs, &mut log_sink);

        // Config auto-save (debounced after the last change).
        app.auto_save_if_needed(&nvs);

        heartbeat.set_period(cfg.heartbeat_interval_ms);
        heartbeat.tick(now);
        watchdog.feed();

        if app.restart_requested() {
            info!("Restart requested; stopping outputs");
            hw.all_off();
            FreeRtos::delay_ms(RESTART_DELAY_MS);
            // SAFETY: esp_restart never returns; all outputs are off.
            unsafe { esp_idf_svc::sys::esp_restart() };
        }

        FreeRtos::delay_ms(cfg.display_tick_ms);
    }
}
