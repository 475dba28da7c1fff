//! Menu context: the shared "blackboard" every screen strategy receives.
//!
//! Holds the single navigation cursor ([`NavState`]), the editor drafts,
//! the schedule store and auxiliary records, plus per-tick inputs
//! (encoder position, time, network status).  Strategies mutate it and
//! leave side effects that need ports (persistence, pump commands) in
//! [`Effects`] for the service to carry out after dispatch.

use crate::app::commands::AppCommand;
use crate::app::ports::{HardwareHealth, WallClock};
use crate::days::DayMask;
use crate::records::AuxRecords;
use crate::schedule::{DosingSchedule, OutletSchedule, ScheduleStore};

use super::MenuId;
use super::render::{Line, Notice, NoticeTone};

/// Index of the "Done" entry after the seven day slots.
pub const DAY_CURSOR_DONE: u8 = 7;

// ---------------------------------------------------------------------------
// Navigation state
// ---------------------------------------------------------------------------

/// The UI cursor.  One instance for the life of the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub current: MenuId,
    /// Selected item, field, or page depending on the screen.
    pub selected: i32,
    pub last_drawn: Option<i32>,
    pub scroll_offset: i32,

    // Edit sub-protocol
    pub edit_mode: bool,
    /// Encoder position the last delta was measured from.
    pub edit_baseline: i32,
    /// `true` while the hour half of a time field is being edited,
    /// and the unit phase of the interval field.
    pub editing_hour: bool,

    // Scratch, re-seeded on entry to the screens that use it
    pub temp_index: Option<usize>,
    pub day_mask: DayMask,
    pub day_cursor: u8,
    pub temp_pump: u8,
    pub temp_amount: u16,
    pub temp_relay: u8,
    pub interval_in_hours: bool,
    pub interval_value: u8,
    pub page: i32,

    pub last_activity_ms: u32,
    pub needs_redraw: bool,
    pub needs_full_redraw: bool,
}

impl NavState {
    pub fn new(now_ms: u32) -> Self {
        Self {
            current: MenuId::Main,
            selected: 0,
            last_drawn: None,
            scroll_offset: 0,
            edit_mode: false,
            edit_baseline: 0,
            editing_hour: true,
            temp_index: None,
            day_mask: DayMask::NONE,
            day_cursor: 0,
            temp_pump: 1,
            temp_amount: 0,
            temp_relay: 1,
            interval_in_hours: true,
            interval_value: 1,
            page: 0,
            last_activity_ms: now_ms,
            needs_redraw: true,
            needs_full_redraw: true,
        }
    }

    pub fn request_full_redraw(&mut self) {
        self.needs_redraw = true;
        self.needs_full_redraw = true;
        self.last_drawn = None;
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Work a strategy asks the service to do once dispatch returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub persist_schedules: bool,
    /// Dosing slots that no longer hold the record they held before.
    pub dosing_slots: Option<SlotChange>,
    pub command: Option<AppCommand>,
}

/// How the dosing list was reshaped by a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    /// One entry removed; later entries moved down by one.
    Removed(usize),
    Cleared,
}

impl Effects {
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

/// Connectivity shown in the main-screen status bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkStatus {
    pub wifi_connected: bool,
    pub mqtt_connected: bool,
    pub ip: Option<Line>,
}

// ---------------------------------------------------------------------------
// MenuContext
// ---------------------------------------------------------------------------

pub struct MenuContext {
    pub nav: NavState,
    /// Encoder position for this tick; written back to the input port.
    pub encoder: i32,
    pub now_ms: u32,
    pub clock: Option<WallClock>,
    pub network: NetworkStatus,
    /// Whether the dosing engine currently holds the pumps.
    pub pumps_busy: bool,
    pub health: HardwareHealth,

    pub store: ScheduleStore,
    pub aux: AuxRecords,
    pub draft_dose: DosingSchedule,
    pub draft_outlet: OutletSchedule,

    pub notice: Option<Notice>,
    pub notice_duration_ms: u32,
    pub effects: Effects,
}

impl MenuContext {
    pub fn new(store: ScheduleStore, aux: AuxRecords, notice_duration_ms: u32, now_ms: u32) -> Self {
        Self {
            nav: NavState::new(now_ms),
            encoder: 0,
            now_ms,
            clock: None,
            network: NetworkStatus::default(),
            pumps_busy: false,
            health: HardwareHealth::ALL_UP,
            store,
            aux,
            draft_dose: DosingSchedule::default(),
            draft_outlet: OutletSchedule::default(),
            notice: None,
            notice_duration_ms,
            effects: Effects::default(),
        }
    }

    // ── Transitions ───────────────────────────────────────────

    /// Enter `menu` with the cursor on `index`.
    ///
    /// Resets scroll and edit mode, moves the shared encoder to `index`
    /// so no position carries over, requests a full redraw, and counts as
    /// user activity.
    pub fn navigate_to(&mut self, menu: MenuId, index: i32) {
        self.nav.current = menu;
        self.nav.selected = index;
        self.nav.scroll_offset = 0;
        self.nav.edit_mode = false;
        self.nav.edit_baseline = index;
        self.encoder = index;
        self.nav.last_activity_ms = self.now_ms;
        self.nav.request_full_redraw();
    }

    /// Return to the main menu and drop every piece of editing scratch.
    pub fn reset_to_home(&mut self) {
        self.navigate_to(MenuId::Main, 0);
        self.nav.editing_hour = true;
        self.nav.day_cursor = 0;
        self.nav.day_mask = DayMask::NONE;
        self.nav.temp_index = None;
        self.nav.page = 0;
    }

    // ── Cursor ────────────────────────────────────────────────

    /// Clamp the encoder into `[0, count - 1]` (0 when empty) and make it
    /// the selection.  Returns the selection.
    pub fn clamp_cursor(&mut self, count: i32) -> i32 {
        let max = (count - 1).max(0);
        let clamped = self.encoder.clamp(0, max);
        self.encoder = clamped;
        if clamped != self.nav.selected {
            self.nav.selected = clamped;
            self.nav.needs_redraw = true;
        }
        clamped
    }

    // ── Edit sub-protocol ─────────────────────────────────────

    /// Start editing the selected field from the current encoder position.
    pub fn enter_edit(&mut self) {
        self.nav.edit_mode = true;
        self.nav.edit_baseline = self.encoder;
        self.nav.needs_redraw = true;
    }

    /// Stop editing and put the encoder back on the field's index.
    pub fn exit_edit(&mut self) {
        self.nav.edit_mode = false;
        self.nav.editing_hour = true;
        self.encoder = self.nav.selected;
        self.nav.edit_baseline = self.encoder;
        self.nav.needs_redraw = true;
    }

    /// Encoder motion since the last call; advances the baseline.
    pub fn take_delta(&mut self) -> i32 {
        let delta = self.encoder - self.nav.edit_baseline;
        self.nav.edit_baseline = self.encoder;
        if delta != 0 {
            self.nav.needs_redraw = true;
        }
        delta
    }

    // ── Notices ───────────────────────────────────────────────

    pub fn post_notice(&mut self, text: &str, tone: NoticeTone) {
        self.notice = Some(Notice::new(text, tone, self.now_ms, self.notice_duration_ms));
        self.nav.needs_redraw = true;
    }

    pub fn request_persist(&mut self) {
        self.effects.persist_schedules = true;
    }

    /// Persist after a dosing deletion and let the service remap the
    /// per-slot cooldowns.
    pub fn request_slot_change(&mut self, change: SlotChange) {
        self.effects.dosing_slots = Some(change);
        self.request_persist();
    }

    pub fn request_command(&mut self, command: AppCommand) {
        self.effects.command = Some(command);
    }
}
