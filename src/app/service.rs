//! Application service, the hexagonal core.
//!
//! [`ControllerService`] owns the menu engine, the schedule store, and the
//! dosing and outlet engines.  It exposes a clean, hardware-agnostic API.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────┐ ──▶ RenderPort
//!   ClockPort ──▶ │    ControllerService     │ ──▶ EventSink
//! StoragePort ◀──▶│ Menu · Dosing · Outlets  │ ──▶ ActuatorPort
//!                 └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::dosing::{DoseRun, DoseSource, DosingEngine};
use crate::menu::context::{MenuContext, SlotChange};
use crate::menu::render::NoticeTone;
use crate::menu::{MenuEngine, MenuId, MenuTransition, build_menu_table};
use crate::outlet::OutletEngine;
use crate::records::AuxRecords;
use crate::schedule::ScheduleStore;
use crate::storage;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{
    ActuatorPort, ClockPort, ConfigPort, EventSink, HardwareHealth, InputPort, RenderPort,
    StoragePort,
};

/// Delay between the last config change and its auto-save.
const CONFIG_SAVE_DELAY_MS: u32 = 5_000;

// ───────────────────────────────────────────────────────────────
// ControllerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ControllerService {
    config: SystemConfig,
    menu: MenuEngine,
    dosing: DosingEngine,
    outlets: OutletEngine,
    tick_count: u64,
    now_ms: u32,
    restart_requested: bool,
    config_dirty: bool,
    dirty_since_ms: u32,
}

impl ControllerService {
    /// Construct the service from configuration and the records loaded
    /// from storage.
    pub fn new(config: SystemConfig, store: ScheduleStore, aux: AuxRecords) -> Self {
        let ctx = MenuContext::new(store, aux, config.notice_duration_ms, 0);
        let menu = MenuEngine::new(build_menu_table(), ctx, config.menu_timeout_ms);
        let dosing = DosingEngine::new(config.dosing_scan_interval_ms, config.dosing_cooldown_ms);
        let outlets = OutletEngine::new(config.dosing_scan_interval_ms);
        Self {
            config,
            menu,
            dosing,
            outlets,
            tick_count: 0,
            now_ms: 0,
            restart_requested: false,
            config_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load schedules and auxiliary records from storage, then build the
    /// service.  Missing or unreadable records fall back to defaults.
    pub fn load(config: SystemConfig, storage: &impl StoragePort) -> Self {
        let mut store = ScheduleStore::new();
        storage::load_schedules(storage, &mut store);
        let mut aux = AuxRecords::default();
        storage::load_aux(storage, &mut aux);
        Self::new(config, store, aux)
    }

    /// Put every output in a known state and announce startup.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.all_off();
        let store = &self.menu.ctx.store;
        sink.emit(&AppEvent::Started {
            dosing: store.dosing.len(),
            outlets: store.outlets.len(),
        });
        info!(
            "ControllerService started with {} dosing / {} outlet schedules",
            store.dosing.len(),
            store.outlets.len()
        );
    }

    /// Record what came up at boot.  Failed pumps disable dosing; any
    /// failure is flagged on the main screen.
    pub fn set_hardware_health(&mut self, health: HardwareHealth) {
        if health.is_degraded() {
            warn!("Running degraded: {:?}", health);
        }
        self.dosing.set_pumps_online(health.pumps);
        self.menu.ctx.health = health;
        self.menu.ctx.nav.needs_redraw = true;
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle:
    /// timeout → input → effects → draw → dosing scan → dosing tick → outlets.
    pub fn tick(
        &mut self,
        clock: &impl ClockPort,
        input: &mut impl InputPort,
        display: &mut impl RenderPort,
        hw: &mut impl ActuatorPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let now = clock.uptime_ms();
        let wall = clock.wall_clock();
        self.now_ms = now;
        self.menu.set_clock(now, wall);

        // 1. Idle timeout
        if let Some(t) = self.menu.check_timeout() {
            input.set_position(self.menu.ctx.encoder);
            sink.emit(&AppEvent::IdleTimeout);
            emit_transition(sink, t);
        }

        // 2. Navigation and selection
        if let Some(t) = self.menu.process_input(input) {
            emit_transition(sink, t);
        }

        // 3. Work the strategies queued for ports
        self.apply_effects(hw, storage, sink);

        // 4. Draw
        self.menu.draw(display);

        // 5. Dosing scan
        let ctx = &self.menu.ctx;
        if let Some(run) = self.dosing.scan(
            now,
            wall.as_ref(),
            ctx.store.dosing.as_slice(),
            &ctx.aux.calibrations,
            hw,
        ) {
            emit_dose_started(sink, &run);
        }

        // 6. Dosing execution
        if let Some(run) = self.dosing.tick(now, hw) {
            sink.emit(&AppEvent::DoseCompleted {
                pump: run.pump,
                source: run.source,
            });
            if run.source == DoseSource::Calibration {
                self.menu.ctx.post_notice("CAL DONE", NoticeTone::Success);
            }
        }

        // 7. Outlets
        for change in self
            .outlets
            .evaluate(now, wall.as_ref(), self.menu.ctx.store.outlets.as_slice(), hw)
        {
            sink.emit(&AppEvent::OutletChanged {
                relay: change.relay,
                on: change.on,
            });
        }

        let busy = self.dosing.is_busy();
        if busy != self.menu.ctx.pumps_busy {
            self.menu.ctx.pumps_busy = busy;
            self.menu.ctx.nav.needs_redraw = true;
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a command from the menu or an external adapter.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let now = self.now_ms;
        match cmd {
            AppCommand::ManualDose { pump, amount_dml } => {
                let cals = &self.menu.ctx.aux.calibrations;
                match self.dosing.start_manual(now, pump, amount_dml, cals, hw) {
                    Ok(run) => {
                        emit_dose_started(sink, &run);
                        self.menu.ctx.post_notice("DOSING...", NoticeTone::Success);
                    }
                    Err(e) => {
                        warn!("Manual dose refused: {e}");
                        self.menu.ctx.post_notice(e.notice_text(), NoticeTone::Error);
                    }
                }
            }
            AppCommand::CalibrationRun { pump } => {
                let cals = &self.menu.ctx.aux.calibrations;
                match self.dosing.start_calibration_run(now, pump, cals, hw) {
                    Ok(run) => {
                        emit_dose_started(sink, &run);
                        self.menu.ctx.post_notice("RUNNING", NoticeTone::Success);
                    }
                    Err(e) => {
                        warn!("Calibration run refused: {e}");
                        self.menu.ctx.post_notice(e.notice_text(), NoticeTone::Error);
                    }
                }
            }
            AppCommand::ResetWifi => {
                if let Err(e) = storage::reset_wifi(storage) {
                    warn!("WiFi reset failed: {e}");
                }
                self.restart_requested = true;
                sink.emit(&AppEvent::ResetPerformed { factory: false });
            }
            AppCommand::FactoryReset => {
                if let Err(e) = storage::factory_reset(storage) {
                    warn!("Factory reset incomplete: {e}");
                }
                hw.all_off();
                self.menu.ctx.store.clear();
                self.menu.ctx.aux = AuxRecords::default();
                self.dosing.reset_cooldowns();
                self.config = SystemConfig::default();
                self.config_dirty = false;
                self.restart_requested = true;
                sink.emit(&AppEvent::ResetPerformed { factory: true });
            }
            AppCommand::UpdateConfig(new_config) => {
                self.mark_config_dirty();
                self.menu.set_timeout(new_config.menu_timeout_ms);
                self.menu.ctx.notice_duration_ms = new_config.notice_duration_ms;
                self.config = new_config;
                info!("Configuration updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.dirty_since_ms = now.wrapping_sub(CONFIG_SAVE_DELAY_MS);
                self.config_dirty = true;
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
    }

    fn apply_effects(
        &mut self,
        hw: &mut impl ActuatorPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let effects = self.menu.ctx.effects.take();
        match effects.dosing_slots {
            Some(SlotChange::Removed(index)) => self.dosing.remove_slot(index),
            Some(SlotChange::Cleared) => self.dosing.reset_cooldowns(),
            None => {}
        }
        if effects.persist_schedules {
            let store = &self.menu.ctx.store;
            match storage::save_schedules(storage, store) {
                Ok(()) => sink.emit(&AppEvent::SchedulesSaved {
                    dosing: store.dosing.len(),
                    outlets: store.outlets.len(),
                }),
                Err(e) => warn!("Schedule save failed, keeping in-memory copy: {e}"),
            }
        }
        if let Some(cmd) = effects.command {
            self.handle_command(cmd, hw, storage, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_menu(&self) -> MenuId {
        self.menu.current()
    }

    pub fn menu(&self) -> &MenuEngine {
        &self.menu
    }

    pub fn schedules(&self) -> &ScheduleStore {
        &self.menu.ctx.store
    }

    pub fn dosing(&self) -> &DosingEngine {
        &self.dosing
    }

    pub fn outlets(&self) -> &OutletEngine {
        &self.outlets
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Set after a reset command; the caller restarts the chip.
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> SystemConfig {
        self.config.clone()
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.
    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = self.now_ms;
        }
    }

    /// Save the config once it has been dirty for five seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, store: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if self.now_ms.wrapping_sub(self.dirty_since_ms) < CONFIG_SAVE_DELAY_MS {
            return false;
        }
        match store.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

fn emit_transition(sink: &mut impl EventSink, t: MenuTransition) {
    sink.emit(&AppEvent::MenuChanged {
        from: t.from,
        to: t.to,
    });
}

fn emit_dose_started(sink: &mut impl EventSink, run: &DoseRun) {
    sink.emit(&AppEvent::DoseStarted {
        pump: run.pump,
        duration_ms: run.duration_ms,
        source: run.source,
    });
}
