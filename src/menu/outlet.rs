//! Outlet schedule screens: menu, editor, view, delete.
//!
//! The editor mirrors the dosing editor with one extra field: Mode flips
//! between an on/off window and a repeat interval.  Switching to interval
//! walks a two-phase edit (unit, then value); while interval mode is on
//! the window fields are drawn grayed and ignore presses.

use log::{info, warn};

use crate::days::DayMask;
use crate::schedule::OutletSchedule;

use super::context::MenuContext;
use super::editors::{self, DAYS_FIELD};
use super::render::{Frame, Line, NoticeTone, Row, fmt_line};
use super::{
    CONFIRM_NO, CONFIRM_YES, MenuDescriptor, MenuId, confirm_frame, page_count, page_span,
    push_items,
};

pub const MENU_ITEMS: &[&str] = &[
    "Add Outlet",
    "View Outlets",
    "Delete Outlet",
    "Delete All",
    "Back",
];

pub const EDITOR_FIELDS: &[&str] = &[
    "Relay", "Days", "Mode", "Time On", "Time Off", "Save", "Cancel",
];

const RELAY: i32 = 0;
const MODE: i32 = 2;
const TIME_ON: i32 = 3;
const TIME_OFF: i32 = 4;
const SAVE: i32 = 5;

const DELETE_ITEM: i32 = 2;
const DELETE_ALL_ITEM: i32 = 3;

pub fn select_menu(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    match ctx.nav.selected {
        0 => {
            ctx.draft_outlet = OutletSchedule::default();
            ctx.nav.day_mask = DayMask::NONE;
            ctx.nav.editing_hour = true;
            ctx.navigate_to(MenuId::OutletAdd, 0);
        }
        1 => {
            ctx.nav.page = 0;
            ctx.navigate_to(MenuId::OutletView, 0);
        }
        2 => ctx.navigate_to(MenuId::OutletDelete, 0),
        3 => ctx.navigate_to(MenuId::OutletDeleteAll, CONFIRM_NO),
        _ => ctx.navigate_to(MenuId::Scheduling, 1),
    }
}

/// One-line summary, e.g. `2 R1 06:00-22:00 Mo-Fr` or `1 R3 /90m All Days`.
pub fn summary(index: usize, s: &OutletSchedule) -> Line {
    if s.is_interval {
        fmt_line(format_args!(
            "{} R{} /{}m {}",
            index + 1,
            s.relay,
            s.interval_minutes,
            s.days.format_compact()
        ))
    } else {
        fmt_line(format_args!(
            "{} R{} {:02}:{:02}-{:02}:{:02} {}",
            index + 1,
            s.relay,
            s.hour_on,
            s.minute_on,
            s.hour_off,
            s.minute_off,
            s.days.format_compact()
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Editor
// ═══════════════════════════════════════════════════════════════════════════

fn time_value(ctx: &MenuContext, field: i32, hour: u8, minute: u8) -> Line {
    let nav = &ctx.nav;
    if nav.edit_mode && nav.selected == field {
        if nav.editing_hour {
            fmt_line(format_args!("[{hour:02}]:{minute:02}"))
        } else {
            fmt_line(format_args!("{hour:02}:[{minute:02}]"))
        }
    } else {
        editors::format_time(hour, minute)
    }
}

fn mode_value(ctx: &MenuContext) -> Line {
    let nav = &ctx.nav;
    let d = &ctx.draft_outlet;
    if !d.is_interval {
        return super::render::line("Window");
    }
    if nav.edit_mode && nav.selected == MODE {
        let unit = if nav.interval_in_hours { "h" } else { "min" };
        if nav.editing_hour {
            fmt_line(format_args!("Every {} [{unit}]", nav.interval_value))
        } else {
            fmt_line(format_args!("Every [{}] {unit}", nav.interval_value))
        }
    } else {
        editors::format_interval(d.interval_minutes)
    }
}

pub fn draw_editor(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let nav = &ctx.nav;
    let d = &ctx.draft_outlet;
    let window = !d.is_interval;
    let mut frame = Frame::new(desc.title);

    frame.field(
        "Relay",
        fmt_line(format_args!("{}", d.relay)),
        editors::field_style(nav, RELAY, true),
    );
    frame.field(
        "Days",
        super::render::line(&nav.day_mask.format_short()),
        editors::field_style(nav, DAYS_FIELD, true),
    );
    frame.field("Mode", mode_value(ctx), editors::field_style(nav, MODE, true));
    frame.field(
        "On",
        time_value(ctx, TIME_ON, d.hour_on, d.minute_on),
        editors::field_style(nav, TIME_ON, window),
    );
    frame.field(
        "Off",
        time_value(ctx, TIME_OFF, d.hour_off, d.minute_off),
        editors::field_style(nav, TIME_OFF, window),
    );
    frame.item("Save", nav.selected == SAVE);
    frame.item("Cancel", nav.selected == SAVE + 1);
    frame
}

pub fn editor_nav(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    editors::editor_navigate(ctx, desc.items.len() as i32, apply_delta);
}

fn apply_delta(ctx: &mut MenuContext, delta: i32) {
    let nav = &mut ctx.nav;
    let d = &mut ctx.draft_outlet;
    match nav.selected {
        RELAY => d.relay = editors::clamp_relay(d.relay, delta),
        MODE if nav.editing_hour => {
            // Unit phase: any rotation flips hours/minutes.
            nav.interval_in_hours = !nav.interval_in_hours;
            nav.interval_value = nav
                .interval_value
                .min(editors::interval_max(nav.interval_in_hours));
        }
        MODE => {
            nav.interval_value =
                editors::clamp_interval(nav.interval_value, delta, nav.interval_in_hours);
        }
        TIME_ON if nav.editing_hour => d.hour_on = editors::clamp_hour(d.hour_on, delta),
        TIME_ON => d.minute_on = editors::clamp_minute(d.minute_on, delta),
        TIME_OFF if nav.editing_hour => d.hour_off = editors::clamp_hour(d.hour_off, delta),
        TIME_OFF => d.minute_off = editors::clamp_minute(d.minute_off, delta),
        _ => {}
    }
}

pub fn editor_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    match ctx.nav.selected {
        RELAY => {
            if ctx.nav.edit_mode {
                ctx.exit_edit();
            } else {
                ctx.enter_edit();
            }
        }
        DAYS_FIELD => editors::open_day_picker(ctx, MenuId::OutletSelectDays),
        MODE => select_mode(ctx),
        TIME_ON | TIME_OFF => {
            if ctx.draft_outlet.is_interval {
                return;
            }
            if !ctx.nav.edit_mode {
                ctx.nav.editing_hour = true;
                ctx.enter_edit();
            } else if ctx.nav.editing_hour {
                ctx.nav.editing_hour = false;
                ctx.nav.needs_redraw = true;
            } else {
                ctx.exit_edit();
            }
        }
        SAVE => save(ctx),
        _ => ctx.navigate_to(MenuId::OutletSchedule, 0),
    }
}

/// Mode press: flip the mode, or advance the interval edit phases.
fn select_mode(ctx: &mut MenuContext) {
    if !ctx.nav.edit_mode {
        let d = &mut ctx.draft_outlet;
        d.is_interval = !d.is_interval;
        if d.is_interval {
            let (in_hours, value) = editors::interval_seed(d.interval_minutes);
            ctx.nav.interval_in_hours = in_hours;
            ctx.nav.interval_value = value;
            ctx.nav.editing_hour = true;
            ctx.enter_edit();
        }
        ctx.nav.needs_redraw = true;
    } else if ctx.nav.editing_hour {
        ctx.nav.editing_hour = false;
        ctx.nav.needs_redraw = true;
    } else {
        ctx.draft_outlet.interval_minutes =
            editors::interval_minutes(ctx.nav.interval_in_hours, ctx.nav.interval_value);
        ctx.exit_edit();
    }
}

pub fn editor_hold(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    if ctx.nav.edit_mode {
        ctx.exit_edit();
        return;
    }
    match ctx.nav.selected {
        DAYS_FIELD => editors::open_day_picker(ctx, MenuId::OutletSelectDays),
        _ => super::hold_back(ctx, desc),
    }
}

fn save(ctx: &mut MenuContext) {
    let record = OutletSchedule {
        days: ctx.nav.day_mask,
        enabled: true,
        ..ctx.draft_outlet
    };
    match ctx.store.outlets.add(record) {
        Ok(index) => {
            info!(
                "Outlet schedule {} saved: relay {}, {}",
                index,
                record.relay,
                summary(index, &record)
            );
            ctx.request_persist();
            ctx.post_notice("SAVED!", NoticeTone::Success);
            ctx.navigate_to(MenuId::OutletSchedule, 0);
        }
        Err(e) => {
            warn!("Outlet schedule rejected: {e}");
            ctx.post_notice(e.notice_text(), NoticeTone::Warning);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  View
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_view(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let list = &ctx.store.outlets;
    let mut frame = Frame::new(desc.title);
    if list.is_empty() {
        frame.text("No outlet schedules");
        return frame;
    }
    let page = ctx.nav.page.max(0) as usize;
    for i in page_span(page * super::PAGE_SIZE, list.len()) {
        if let Some(s) = list.get(i) {
            frame.push(Row::Text(summary(i, s)));
        }
    }
    frame.blank();
    frame.text_fmt(format_args!("Page {}/{}", page + 1, page_count(list.len())));
    frame
}

pub fn view_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    ctx.nav.page = ctx.clamp_cursor(page_count(ctx.store.outlets.len()) as i32);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Delete
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_delete(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let list = &ctx.store.outlets;
    let selected = ctx.nav.selected.max(0) as usize;
    let mut frame = Frame::new(desc.title);
    for i in page_span(selected, list.len() + 1) {
        match list.get(i) {
            Some(s) => frame.item(&summary(i, s), i == selected),
            None => frame.item("Return to Menu", i == selected),
        }
    }
    frame
}

pub fn delete_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    ctx.clamp_cursor(ctx.store.outlets.len() as i32 + 1);
}

pub fn delete_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let selected = ctx.nav.selected.max(0) as usize;
    if selected < ctx.store.outlets.len() {
        ctx.nav.temp_index = Some(selected);
        ctx.navigate_to(MenuId::OutletDeleteConfirm, CONFIRM_NO);
    } else {
        ctx.navigate_to(MenuId::OutletSchedule, DELETE_ITEM);
    }
}

pub fn draw_delete_confirm(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let index = ctx.nav.temp_index.unwrap_or(0);
    let message = fmt_line(format_args!("Delete outlet {}?", index + 1));
    let mut frame = Frame::dialog(desc.title, &message);
    if let Some(s) = ctx.store.outlets.get(index) {
        frame.push(Row::Text(summary(index, s)));
    }
    push_items(&mut frame, ctx, desc);
    frame
}

pub fn delete_confirm_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let index = ctx.nav.temp_index.take();
    if ctx.nav.selected == CONFIRM_YES {
        if let Some(removed) = index.and_then(|i| ctx.store.outlets.remove(i)) {
            info!(
                "Outlet schedule deleted (relay {}), {} remain",
                removed.relay,
                ctx.store.outlets.len()
            );
            ctx.request_persist();
            ctx.post_notice("DELETED!", NoticeTone::Success);
        }
    }
    let back = index.unwrap_or(0).min(ctx.store.outlets.len());
    ctx.navigate_to(MenuId::OutletDelete, back as i32);
}

pub fn draw_delete_all(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let message = fmt_line(format_args!("Delete all {} outlets?", ctx.store.outlets.len()));
    confirm_frame(ctx, desc, &message)
}

pub fn delete_all_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    if ctx.nav.selected == CONFIRM_YES {
        info!("All {} outlet schedules deleted", ctx.store.outlets.len());
        ctx.store.outlets.clear();
        ctx.request_persist();
        ctx.post_notice("ALL DELETED!", NoticeTone::Success);
        ctx.navigate_to(MenuId::OutletSchedule, 0);
    } else {
        ctx.navigate_to(MenuId::OutletSchedule, DELETE_ALL_ITEM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::build_menu_table;
    use crate::menu::render::FieldStyle;
    use crate::records::AuxRecords;
    use crate::schedule::{MAX_OUTLET_SCHEDULES, ScheduleStore};

    fn ctx_at(menu: MenuId, index: i32) -> MenuContext {
        let mut ctx = MenuContext::new(ScheduleStore::new(), AuxRecords::default(), 900, 0);
        ctx.navigate_to(menu, index);
        ctx
    }

    fn turn(ctx: &mut MenuContext, to: i32) {
        let table = build_menu_table();
        ctx.encoder = to;
        let desc = &table[ctx.nav.current as usize];
        (desc.navigate)(ctx, desc);
    }

    fn press(ctx: &mut MenuContext) {
        let table = build_menu_table();
        let desc = &table[ctx.nav.current as usize];
        (desc.select)(ctx, desc);
    }

    fn outlet(relay: u8) -> OutletSchedule {
        OutletSchedule {
            relay,
            days: DayMask::ALL,
            enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn relay_field_clamps() {
        let mut ctx = ctx_at(MenuId::OutletAdd, RELAY);
        press(&mut ctx);
        turn(&mut ctx, 10);
        assert_eq!(ctx.draft_outlet.relay, 4);
        turn(&mut ctx, -10);
        assert_eq!(ctx.draft_outlet.relay, 1);
    }

    #[test]
    fn mode_switch_walks_unit_then_value() {
        let mut ctx = ctx_at(MenuId::OutletAdd, MODE);
        // Default interval is 60 min: seeds as 1 hour.
        press(&mut ctx);
        assert!(ctx.draft_outlet.is_interval);
        assert!(ctx.nav.edit_mode && ctx.nav.editing_hour);
        assert!(ctx.nav.interval_in_hours);
        assert_eq!(ctx.nav.interval_value, 1);

        // Unit phase: any rotation flips to minutes.
        turn(&mut ctx, MODE + 1);
        assert!(!ctx.nav.interval_in_hours);

        press(&mut ctx);
        assert!(!ctx.nav.editing_hour);
        turn(&mut ctx, MODE + 1 + 100);
        assert_eq!(ctx.nav.interval_value, 59);

        press(&mut ctx);
        assert!(!ctx.nav.edit_mode);
        assert_eq!(ctx.draft_outlet.interval_minutes, 59);
    }

    #[test]
    fn interval_value_in_hours_commits_minutes() {
        let mut ctx = ctx_at(MenuId::OutletAdd, MODE);
        press(&mut ctx);
        press(&mut ctx);
        turn(&mut ctx, MODE + 2);
        press(&mut ctx);
        assert_eq!(ctx.draft_outlet.interval_minutes, 180);
    }

    #[test]
    fn window_fields_inert_in_interval_mode() {
        let mut ctx = ctx_at(MenuId::OutletAdd, TIME_ON);
        ctx.draft_outlet.is_interval = true;
        press(&mut ctx);
        assert!(!ctx.nav.edit_mode);

        let table = build_menu_table();
        let desc = &table[MenuId::OutletAdd as usize];
        ctx.nav.selected = RELAY;
        let frame = (desc.draw)(&ctx, desc);
        match &frame.rows[TIME_OFF as usize] {
            Row::Field { style, .. } => assert_eq!(*style, FieldStyle::Inactive),
            other => panic!("unexpected row {other:?}"),
        }
    }

    #[test]
    fn window_time_clamps() {
        let mut ctx = ctx_at(MenuId::OutletAdd, TIME_OFF);
        press(&mut ctx);
        turn(&mut ctx, TIME_OFF + 5);
        assert_eq!(ctx.draft_outlet.hour_off, 23);
        press(&mut ctx);
        turn(&mut ctx, TIME_OFF + 5 - 3);
        assert_eq!(ctx.draft_outlet.minute_off, 0);
    }

    #[test]
    fn save_rules_match_dosing() {
        let mut ctx = ctx_at(MenuId::OutletAdd, SAVE);
        press(&mut ctx);
        assert_eq!(ctx.notice.as_ref().map(|n| n.text.as_str()), Some("SELECT DAYS!"));

        for _ in 0..MAX_OUTLET_SCHEDULES {
            ctx.store.outlets.add(outlet(1)).unwrap();
        }
        ctx.nav.day_mask = DayMask::ALL;
        press(&mut ctx);
        assert_eq!(ctx.notice.as_ref().map(|n| n.text.as_str()), Some("LIST FULL!"));

        ctx.store.outlets.clear();
        press(&mut ctx);
        assert_eq!(ctx.store.outlets.len(), 1);
        assert_eq!(ctx.nav.current, MenuId::OutletSchedule);
    }

    #[test]
    fn delete_shifts_and_returns_to_list() {
        let mut ctx = ctx_at(MenuId::OutletDelete, 0);
        for relay in 1..=3 {
            ctx.store.outlets.add(outlet(relay)).unwrap();
        }
        press(&mut ctx);
        turn(&mut ctx, CONFIRM_YES);
        press(&mut ctx);
        let relays: Vec<u8> = ctx.store.outlets.iter().map(|s| s.relay).collect();
        assert_eq!(relays, [2, 3]);
        assert_eq!(ctx.nav.current, MenuId::OutletDelete);
    }
}
