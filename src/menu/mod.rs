//! Table-driven menu navigation engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  MenuTable  [MenuDescriptor; MenuId::COUNT]                    │
//! │  ┌──────────────┬───────┬──────────┬──────────┬───────┬──────┐ │
//! │  │ MenuId       │ draw  │ navigate │ select   │ hold  │ back │ │
//! │  ├──────────────┼───────┼──────────┼──────────┼───────┼──────┤ │
//! │  │ Main         │ fn    │ fn       │ fn       │ fn    │ Main │ │
//! │  │ Scheduling   │ list  │ default  │ link     │ back  │ Main │ │
//! │  │ DosingAdd    │ fn    │ fn       │ fn       │ fn    │ ...  │ │
//! │  │ ...          │       │          │          │       │      │ │
//! │  └──────────────┴───────┴──────────┴──────────┴───────┴──────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every descriptor carries all four strategies.  [`MenuDescriptor::list`]
//! fills them with the defaults ([`draw_list`], [`default_nav`],
//! [`select_back`], [`hold_back`]); screens override only what they need.
//!
//! Each tick the engine dispatches, in order: idle timeout, `navigate`,
//! `select` (short press) or `hold` (long press), and finally `draw` when a
//! redraw is pending.  All strategies receive `&mut MenuContext`.

pub mod context;
pub mod dosing;
pub mod editors;
pub mod outlet;
pub mod render;
pub mod system;

use log::{debug, info};

use crate::app::ports::{InputPort, RenderPort, WallClock};
use context::MenuContext;
use render::{Frame, Renderer};

/// Rows visible at once in a scrolling list.
pub const VISIBLE_ROWS: i32 = 8;

// ---------------------------------------------------------------------------
// Menu identity
// ---------------------------------------------------------------------------

/// Every screen the controller can show.
/// Must stay in sync with the table built in [`build_menu_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MenuId {
    Main = 0,
    Scheduling = 1,
    DosingSchedule = 2,
    DosingView = 3,
    DosingAdd = 4,
    DosingSelectDays = 5,
    DosingSetTime = 6,
    DosingSetAmount = 7,
    DosingDelete = 8,
    DosingDeleteConfirm = 9,
    DosingDeleteAll = 10,
    OutletSchedule = 11,
    OutletView = 12,
    OutletAdd = 13,
    OutletSelectDays = 14,
    OutletDelete = 15,
    OutletDeleteConfirm = 16,
    OutletDeleteAll = 17,
    ManualDosing = 18,
    PumpCalibration = 19,
    CalibratePump = 20,
    TopUpSolution = 21,
    TopUpAmounts = 22,
    TopUpFillRelay = 23,
    ReplaceSolution = 24,
    ReplaceAmounts = 25,
    ReplaceDrain = 26,
    ReplaceFill = 27,
    ReplaceSchedule = 28,
    ResetWifiConfirm = 29,
    FactoryResetConfirm = 30,
}

impl MenuId {
    pub const COUNT: usize = 31;

    pub const ALL: [MenuId; MenuId::COUNT] = [
        Self::Main,
        Self::Scheduling,
        Self::DosingSchedule,
        Self::DosingView,
        Self::DosingAdd,
        Self::DosingSelectDays,
        Self::DosingSetTime,
        Self::DosingSetAmount,
        Self::DosingDelete,
        Self::DosingDeleteConfirm,
        Self::DosingDeleteAll,
        Self::OutletSchedule,
        Self::OutletView,
        Self::OutletAdd,
        Self::OutletSelectDays,
        Self::OutletDelete,
        Self::OutletDeleteConfirm,
        Self::OutletDeleteAll,
        Self::ManualDosing,
        Self::PumpCalibration,
        Self::CalibratePump,
        Self::TopUpSolution,
        Self::TopUpAmounts,
        Self::TopUpFillRelay,
        Self::ReplaceSolution,
        Self::ReplaceAmounts,
        Self::ReplaceDrain,
        Self::ReplaceFill,
        Self::ReplaceSchedule,
        Self::ResetWifiConfirm,
        Self::FactoryResetConfirm,
    ];

    /// Convert an index back to `MenuId`; out-of-range falls back to `Main`.
    pub fn from_index(idx: usize) -> Self {
        match Self::ALL.get(idx) {
            Some(id) => *id,
            None => {
                debug_assert!(false, "invalid menu index: {idx}");
                Self::Main
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy signatures
// ---------------------------------------------------------------------------

/// Compose the screen for the current context.
pub type DrawFn = fn(&MenuContext, &MenuDescriptor) -> Frame;

/// Per-tick encoder handling, and the press / long-press handlers.
pub type ActionFn = fn(&mut MenuContext, &MenuDescriptor);

// ---------------------------------------------------------------------------
// Descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct MenuDescriptor {
    pub id: MenuId,
    pub title: &'static str,
    pub items: &'static [&'static str],
    /// Targets for [`select_link`]; `links[i]` is entered when `items[i]`
    /// is pressed.
    pub links: &'static [MenuId],
    pub scrolling: bool,
    pub back: MenuId,
    pub draw: DrawFn,
    pub navigate: ActionFn,
    pub select: ActionFn,
    pub hold: ActionFn,
}

impl MenuDescriptor {
    /// A plain list screen with every default strategy.
    pub fn list(
        id: MenuId,
        title: &'static str,
        items: &'static [&'static str],
        back: MenuId,
    ) -> Self {
        Self {
            id,
            title,
            items,
            links: &[],
            scrolling: false,
            back,
            draw: draw_list,
            navigate: default_nav,
            select: select_back,
            hold: hold_back,
        }
    }

    /// A submenu: pressing item `i` enters `links[i]`.
    pub fn submenu(
        id: MenuId,
        title: &'static str,
        items: &'static [&'static str],
        links: &'static [MenuId],
        back: MenuId,
    ) -> Self {
        Self {
            links,
            select: select_link,
            ..Self::list(id, title, items, back)
        }
    }

    pub fn scrolling(mut self) -> Self {
        self.scrolling = true;
        self
    }

    pub fn drawn_by(mut self, draw: DrawFn) -> Self {
        self.draw = draw;
        self
    }

    pub fn navigated_by(mut self, navigate: ActionFn) -> Self {
        self.navigate = navigate;
        self
    }

    pub fn selected_by(mut self, select: ActionFn) -> Self {
        self.select = select;
        self
    }

    pub fn held_by(mut self, hold: ActionFn) -> Self {
        self.hold = hold;
        self
    }
}

// ---------------------------------------------------------------------------
// Default strategies
// ---------------------------------------------------------------------------

/// Items as a list, windowed by the scroll offset.
pub fn draw_list(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    push_items(&mut frame, ctx, desc);
    frame
}

/// Append the descriptor's items to `frame`, honouring the scroll window.
pub fn push_items(frame: &mut Frame, ctx: &MenuContext, desc: &MenuDescriptor) {
    let count = desc.items.len() as i32;
    let (start, end) = if desc.scrolling {
        let start = ctx.nav.scroll_offset.clamp(0, count);
        (start, (start + VISIBLE_ROWS).min(count))
    } else {
        (0, count)
    };
    for i in start..end {
        frame.item(desc.items[i as usize], ctx.nav.selected == i);
    }
}

/// Clamp the encoder onto the item list and keep the selection visible.
pub fn default_nav(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    let selected = ctx.clamp_cursor(desc.items.len() as i32);
    let offset = if desc.scrolling {
        scroll_window(ctx.nav.scroll_offset, selected)
    } else {
        0
    };
    if offset != ctx.nav.scroll_offset {
        ctx.nav.scroll_offset = offset;
        ctx.nav.needs_redraw = true;
    }
}

/// New scroll offset keeping `selected` inside a [`VISIBLE_ROWS`] window.
pub fn scroll_window(offset: i32, selected: i32) -> i32 {
    if selected < offset {
        selected
    } else if selected >= offset + VISIBLE_ROWS {
        selected - (VISIBLE_ROWS - 1)
    } else {
        offset
    }
}

pub fn select_back(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    ctx.navigate_to(desc.back, 0);
}

pub fn hold_back(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    if desc.id != desc.back {
        ctx.navigate_to(desc.back, 0);
    }
}

/// Enter the linked menu; items past the link table go back.
pub fn select_link(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    match desc.links.get(ctx.nav.selected as usize) {
        Some(&target) => ctx.navigate_to(target, 0),
        None => ctx.navigate_to(desc.back, 0),
    }
}

/// A strategy slot with nothing to do.
pub fn ignore(_ctx: &mut MenuContext, _desc: &MenuDescriptor) {}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

const SCHEDULING_ITEMS: &[&str] = &["Dosing Schedule", "Outlet Schedule", "Back"];
const SCHEDULING_LINKS: &[MenuId] = &[MenuId::DosingSchedule, MenuId::OutletSchedule, MenuId::Main];

const TOP_UP_ITEMS: &[&str] = &["Pump Amounts", "Fill Relay", "Back"];
const TOP_UP_LINKS: &[MenuId] = &[MenuId::TopUpAmounts, MenuId::TopUpFillRelay, MenuId::Main];

const REPLACE_ITEMS: &[&str] = &["Pump Amounts", "Drain Relay", "Fill Relay", "Schedule", "Back"];
const REPLACE_LINKS: &[MenuId] = &[
    MenuId::ReplaceAmounts,
    MenuId::ReplaceDrain,
    MenuId::ReplaceFill,
    MenuId::ReplaceSchedule,
    MenuId::Main,
];

/// Build the menu table.  Called once at startup.
pub fn build_menu_table() -> [MenuDescriptor; MenuId::COUNT] {
    use MenuId::*;
    [
        // 0
        MenuDescriptor::list(Main, "MAIN MENU", system::MAIN_ITEMS, Main)
            .drawn_by(system::draw_main)
            .selected_by(system::select_main),
        // 1
        MenuDescriptor::submenu(Scheduling, "SCHEDULING", SCHEDULING_ITEMS, SCHEDULING_LINKS, Main),
        // 2..=10 dosing
        MenuDescriptor::list(DosingSchedule, "DOSING SCHEDULE", dosing::MENU_ITEMS, Scheduling)
            .selected_by(dosing::select_menu),
        MenuDescriptor::list(DosingView, "DOSING SCHEDULES", &[], DosingSchedule)
            .drawn_by(dosing::draw_view)
            .navigated_by(dosing::view_nav),
        MenuDescriptor::list(DosingAdd, "ADD DOSING", dosing::EDITOR_FIELDS, DosingSchedule)
            .drawn_by(dosing::draw_editor)
            .navigated_by(dosing::editor_nav)
            .selected_by(dosing::editor_select)
            .held_by(dosing::editor_hold),
        MenuDescriptor::list(DosingSelectDays, "SELECT DAYS", &[], DosingAdd)
            .drawn_by(editors::draw_day_picker)
            .navigated_by(editors::day_picker_nav)
            .selected_by(editors::day_picker_select)
            .held_by(editors::day_picker_hold),
        MenuDescriptor::list(DosingSetTime, "SET TIME", &[], DosingAdd)
            .drawn_by(dosing::draw_time_picker)
            .navigated_by(dosing::time_picker_nav)
            .selected_by(dosing::time_picker_select)
            .held_by(dosing::time_picker_hold),
        MenuDescriptor::list(DosingSetAmount, "SET AMOUNT", &[], DosingAdd)
            .drawn_by(dosing::draw_amount_picker)
            .navigated_by(dosing::amount_picker_nav)
            .selected_by(dosing::amount_picker_done)
            .held_by(dosing::amount_picker_done),
        MenuDescriptor::list(DosingDelete, "DELETE DOSING", &[], DosingSchedule)
            .drawn_by(dosing::draw_delete)
            .navigated_by(dosing::delete_nav)
            .selected_by(dosing::delete_select),
        MenuDescriptor::list(DosingDeleteConfirm, "CONFIRM DELETE", CONFIRM_ITEMS, DosingDelete)
            .drawn_by(dosing::draw_delete_confirm)
            .selected_by(dosing::delete_confirm_select),
        MenuDescriptor::list(DosingDeleteAll, "DELETE ALL", CONFIRM_ITEMS, DosingSchedule)
            .drawn_by(dosing::draw_delete_all)
            .selected_by(dosing::delete_all_select),
        // 11..=17 outlets
        MenuDescriptor::list(OutletSchedule, "OUTLET SCHEDULE", outlet::MENU_ITEMS, Scheduling)
            .selected_by(outlet::select_menu),
        MenuDescriptor::list(OutletView, "OUTLET SCHEDULES", &[], OutletSchedule)
            .drawn_by(outlet::draw_view)
            .navigated_by(outlet::view_nav),
        MenuDescriptor::list(OutletAdd, "ADD OUTLET", outlet::EDITOR_FIELDS, OutletSchedule)
            .drawn_by(outlet::draw_editor)
            .navigated_by(outlet::editor_nav)
            .selected_by(outlet::editor_select)
            .held_by(outlet::editor_hold),
        MenuDescriptor::list(OutletSelectDays, "SELECT DAYS", &[], OutletAdd)
            .drawn_by(editors::draw_day_picker)
            .navigated_by(editors::day_picker_nav)
            .selected_by(editors::day_picker_select)
            .held_by(editors::day_picker_hold),
        MenuDescriptor::list(OutletDelete, "DELETE OUTLET", &[], OutletSchedule)
            .drawn_by(outlet::draw_delete)
            .navigated_by(outlet::delete_nav)
            .selected_by(outlet::delete_select),
        MenuDescriptor::list(OutletDeleteConfirm, "CONFIRM DELETE", CONFIRM_ITEMS, OutletDelete)
            .drawn_by(outlet::draw_delete_confirm)
            .selected_by(outlet::delete_confirm_select),
        MenuDescriptor::list(OutletDeleteAll, "DELETE ALL", CONFIRM_ITEMS, OutletSchedule)
            .drawn_by(outlet::draw_delete_all)
            .selected_by(outlet::delete_all_select),
        // 18..=20 pumps
        MenuDescriptor::list(ManualDosing, "MANUAL DOSING", system::MANUAL_FIELDS, Main)
            .drawn_by(system::draw_manual)
            .navigated_by(system::manual_nav)
            .selected_by(system::manual_select),
        MenuDescriptor::list(PumpCalibration, "PUMP CALIBRATION", system::CALIBRATION_ITEMS, Main)
            .selected_by(system::select_calibration),
        MenuDescriptor::list(CalibratePump, "CALIBRATE PUMP", system::CALIBRATE_ITEMS, PumpCalibration)
            .drawn_by(system::draw_calibrate)
            .selected_by(system::calibrate_select),
        // 21..=23 top-up
        MenuDescriptor::submenu(TopUpSolution, "TOP-UP SOLUTION", TOP_UP_ITEMS, TOP_UP_LINKS, Main),
        MenuDescriptor::list(TopUpAmounts, "TOP-UP AMOUNTS", &[], TopUpSolution)
            .drawn_by(system::draw_top_up_amounts),
        MenuDescriptor::list(TopUpFillRelay, "TOP-UP FILL RELAY", &[], TopUpSolution)
            .drawn_by(system::draw_top_up_relay),
        // 24..=28 replace
        MenuDescriptor::submenu(ReplaceSolution, "REPLACE SOLUTION", REPLACE_ITEMS, REPLACE_LINKS, Main),
        MenuDescriptor::list(ReplaceAmounts, "REPLACE AMOUNTS", &[], ReplaceSolution)
            .drawn_by(system::draw_replace_amounts),
        MenuDescriptor::list(ReplaceDrain, "DRAIN RELAY", &[], ReplaceSolution)
            .drawn_by(system::draw_replace_drain),
        MenuDescriptor::list(ReplaceFill, "FILL RELAY", &[], ReplaceSolution)
            .drawn_by(system::draw_replace_fill),
        MenuDescriptor::list(ReplaceSchedule, "REPLACE SCHEDULE", &[], ReplaceSolution)
            .drawn_by(system::draw_replace_schedule),
        // 29..=30 resets
        MenuDescriptor::list(ResetWifiConfirm, "RESET WIFI", CONFIRM_ITEMS, Main)
            .drawn_by(system::draw_reset_wifi)
            .selected_by(system::reset_wifi_select),
        MenuDescriptor::list(FactoryResetConfirm, "FACTORY RESET", CONFIRM_ITEMS, Main)
            .drawn_by(system::draw_factory_reset)
            .selected_by(system::factory_reset_select),
    ]
}

/// Answers of every Yes/No dialog.  The cursor opens on [`CONFIRM_NO`].
pub const CONFIRM_ITEMS: &[&str] = &["Yes", "No"];
pub const CONFIRM_YES: i32 = 0;
pub const CONFIRM_NO: i32 = 1;

/// Dialog frame with the Yes/No answers as list rows.
pub fn confirm_frame(ctx: &MenuContext, desc: &MenuDescriptor, message: &str) -> Frame {
    let mut frame = Frame::dialog(desc.title, message);
    push_items(&mut frame, ctx, desc);
    frame
}

/// Records per page on the view and delete screens.
pub const PAGE_SIZE: usize = 6;

pub fn page_count(entries: usize) -> usize {
    entries.div_ceil(PAGE_SIZE).max(1)
}

/// Entry range shown on the page containing `selected`.
pub fn page_span(selected: usize, entries: usize) -> core::ops::Range<usize> {
    let start = (selected / PAGE_SIZE) * PAGE_SIZE;
    start..(start + PAGE_SIZE).min(entries)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A completed menu change, reported to the caller for event emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuTransition {
    pub from: MenuId,
    pub to: MenuId,
}

/// The menu engine.
///
/// Owns the descriptor table, the [`MenuContext`] every strategy mutates,
/// and the [`Renderer`] holding the last presented frame.
pub struct MenuEngine {
    table: [MenuDescriptor; MenuId::COUNT],
    pub ctx: MenuContext,
    renderer: Renderer,
    timeout_ms: u32,
    /// Encoder position seen at the end of the previous tick.
    last_position: i32,
    /// Second shown in the main-screen status row.
    shown_second: Option<u8>,
}

impl MenuEngine {
    pub fn new(table: [MenuDescriptor; MenuId::COUNT], ctx: MenuContext, timeout_ms: u32) -> Self {
        Self {
            table,
            ctx,
            renderer: Renderer::new(),
            timeout_ms,
            last_position: 0,
            shown_second: None,
        }
    }

    pub fn current(&self) -> MenuId {
        self.ctx.nav.current
    }

    pub fn descriptor(&self, id: MenuId) -> &MenuDescriptor {
        &self.table[id as usize]
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    /// Update the time inputs.  On the main screen a new second marks the
    /// status row for a partial redraw.
    pub fn set_clock(&mut self, now_ms: u32, clock: Option<WallClock>) {
        self.ctx.now_ms = now_ms;
        self.ctx.clock = clock;
        let second = clock.map(|c| c.second);
        if second != self.shown_second {
            self.shown_second = second;
            if self.ctx.nav.current == MenuId::Main {
                self.ctx.nav.needs_redraw = true;
            }
        }
    }

    /// Return to the main menu after `timeout_ms` without activity.
    /// Returns the transition when one happened.
    pub fn check_timeout(&mut self) -> Option<MenuTransition> {
        let from = self.ctx.nav.current;
        if from == MenuId::Main {
            return None;
        }
        let idle = self.ctx.now_ms.wrapping_sub(self.ctx.nav.last_activity_ms);
        if idle <= self.timeout_ms {
            return None;
        }
        info!("Menu idle for {idle} ms, returning home");
        self.ctx.reset_to_home();
        self.last_position = self.ctx.encoder;
        Some(MenuTransition {
            from,
            to: MenuId::Main,
        })
    }

    /// Read the encoder and button, and dispatch `navigate` then
    /// `select` / `hold` on the current descriptor.
    pub fn process_input(&mut self, input: &mut impl InputPort) -> Option<MenuTransition> {
        let from = self.ctx.nav.current;

        let position = input.position();
        self.ctx.encoder = position;
        if position != self.last_position {
            self.ctx.nav.last_activity_ms = self.ctx.now_ms;
        }

        let desc = &self.table[self.ctx.nav.current as usize];
        (desc.navigate)(&mut self.ctx, desc);

        if input.take_press() {
            self.ctx.nav.last_activity_ms = self.ctx.now_ms;
            let desc = &self.table[self.ctx.nav.current as usize];
            debug!("Select on {:?} item {}", desc.id, self.ctx.nav.selected);
            (desc.select)(&mut self.ctx, desc);
        } else if input.take_long_press() {
            self.ctx.nav.last_activity_ms = self.ctx.now_ms;
            let desc = &self.table[self.ctx.nav.current as usize];
            debug!("Hold on {:?} item {}", desc.id, self.ctx.nav.selected);
            (desc.hold)(&mut self.ctx, desc);
        }

        if self.ctx.encoder != position {
            input.set_position(self.ctx.encoder);
        }
        self.last_position = self.ctx.encoder;

        let to = self.ctx.nav.current;
        if to != from {
            info!(
                "Menu transition: {} -> {}",
                self.table[from as usize].title, self.table[to as usize].title
            );
            Some(MenuTransition { from, to })
        } else {
            None
        }
    }

    /// Present the current screen if a redraw is pending.
    /// Returns `true` when anything was drawn.
    pub fn draw(&mut self, surface: &mut impl RenderPort) -> bool {
        if let Some(notice) = &self.ctx.notice {
            if notice.is_expired(self.ctx.now_ms) {
                self.ctx.notice = None;
                self.ctx.nav.request_full_redraw();
            }
        }

        if !self.ctx.nav.needs_redraw {
            return false;
        }

        let desc = &self.table[self.ctx.nav.current as usize];
        let frame = (desc.draw)(&self.ctx, desc);
        self.renderer
            .present(&frame, self.ctx.nav.needs_full_redraw, surface);
        if let Some(notice) = &self.ctx.notice {
            surface.draw_notice(notice);
        }

        self.ctx.nav.last_drawn = Some(self.ctx.nav.selected);
        self.ctx.nav.needs_redraw = false;
        self.ctx.nav.needs_full_redraw = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::display::TextDisplay;
    use crate::records::AuxRecords;
    use crate::schedule::ScheduleStore;

    /// Scripted encoder and button.
    #[derive(Default)]
    struct Script {
        position: i32,
        press: bool,
        long_press: bool,
    }

    impl InputPort for Script {
        fn position(&self) -> i32 {
            self.position
        }
        fn set_position(&mut self, position: i32) {
            self.position = position;
        }
        fn take_press(&mut self) -> bool {
            core::mem::take(&mut self.press)
        }
        fn take_long_press(&mut self) -> bool {
            core::mem::take(&mut self.long_press)
        }
    }

    fn engine() -> MenuEngine {
        let ctx = MenuContext::new(ScheduleStore::new(), AuxRecords::default(), 900, 0);
        MenuEngine::new(build_menu_table(), ctx, 30_000)
    }

    fn press(e: &mut MenuEngine, input: &mut Script) -> Option<MenuTransition> {
        input.press = true;
        e.process_input(input)
    }

    #[test]
    fn table_is_indexed_by_id() {
        let table = build_menu_table();
        for (i, desc) in table.iter().enumerate() {
            assert_eq!(desc.id as usize, i, "descriptor {} out of place", desc.title);
            assert_eq!(MenuId::from_index(i), desc.id);
        }
    }

    #[test]
    fn submenu_links_cover_items() {
        for desc in build_menu_table().iter().filter(|d| !d.links.is_empty()) {
            assert_eq!(desc.links.len(), desc.items.len(), "{}", desc.title);
        }
    }

    #[test]
    fn scroll_window_follows_selection() {
        assert_eq!(scroll_window(0, 3), 0);
        assert_eq!(scroll_window(0, 8), 1);
        assert_eq!(scroll_window(4, 2), 2);
        assert_eq!(scroll_window(2, 9), 2);
    }

    #[test]
    fn default_nav_clamps_encoder() {
        let mut e = engine();
        let mut input = Script {
            position: 42,
            ..Default::default()
        };
        e.process_input(&mut input);
        let last = system::MAIN_ITEMS.len() as i32 - 1;
        assert_eq!(e.ctx.nav.selected, last);
        assert_eq!(input.position, last, "clamped position written back");

        input.position = -5;
        e.process_input(&mut input);
        assert_eq!(e.ctx.nav.selected, 0);
        assert_eq!(input.position, 0);
    }

    #[test]
    fn press_follows_links_and_resets_encoder() {
        let mut e = engine();
        let mut input = Script::default();
        // Main item 0 is Scheduling.
        let t = press(&mut e, &mut input);
        assert_eq!(
            t,
            Some(MenuTransition {
                from: MenuId::Main,
                to: MenuId::Scheduling
            })
        );
        input.position = 1;
        e.process_input(&mut input);
        press(&mut e, &mut input);
        assert_eq!(e.current(), MenuId::OutletSchedule);
        assert_eq!(input.position, 0);
        assert!(e.ctx.nav.needs_full_redraw);
    }

    #[test]
    fn long_press_goes_back() {
        let mut e = engine();
        let mut input = Script::default();
        press(&mut e, &mut input);
        assert_eq!(e.current(), MenuId::Scheduling);
        input.long_press = true;
        e.process_input(&mut input);
        assert_eq!(e.current(), MenuId::Main);
    }

    #[test]
    fn idle_timeout_returns_home() {
        let mut e = engine();
        let mut input = Script::default();
        press(&mut e, &mut input);
        assert_eq!(e.current(), MenuId::Scheduling);

        e.set_clock(30_000, None);
        assert_eq!(e.check_timeout(), None, "exactly the timeout is not idle");
        e.set_clock(30_001, None);
        let t = e.check_timeout();
        assert_eq!(t.map(|t| t.to), Some(MenuId::Main));
        assert_eq!(e.ctx.encoder, 0);
        assert!(e.ctx.nav.needs_full_redraw);
    }

    #[test]
    fn activity_defers_timeout() {
        let mut e = engine();
        let mut input = Script::default();
        press(&mut e, &mut input);
        e.set_clock(20_000, None);
        input.position = 1;
        e.process_input(&mut input);
        e.set_clock(40_000, None);
        assert_eq!(e.check_timeout(), None);
    }

    #[test]
    fn draw_is_noop_without_pending_redraw() {
        let mut e = engine();
        let mut d = TextDisplay::new();
        assert!(e.draw(&mut d));
        assert!(!e.draw(&mut d));
        assert_eq!(d.clears(), 1);
    }

    #[test]
    fn cursor_move_is_a_partial_redraw() {
        let mut e = engine();
        let mut d = TextDisplay::new();
        let mut input = Script::default();
        e.draw(&mut d);
        input.position = 1;
        e.process_input(&mut input);
        assert!(e.ctx.nav.needs_redraw);
        assert!(!e.ctx.nav.needs_full_redraw);
        assert!(e.draw(&mut d));
        assert_eq!(d.clears(), 1);
    }

    #[test]
    fn expired_notice_forces_full_redraw() {
        let mut e = engine();
        let mut d = TextDisplay::new();
        e.draw(&mut d);
        e.ctx.post_notice("SAVED!", render::NoticeTone::Success);
        e.draw(&mut d);
        assert_eq!(d.notices(), 1);

        e.set_clock(899, None);
        assert!(!e.draw(&mut d), "notice still showing");
        e.set_clock(900, None);
        assert!(e.draw(&mut d));
        assert!(e.ctx.notice.is_none());
        assert_eq!(d.clears(), 2);
    }
}
