//! Dosing schedule screens: menu, editor, pickers, view, delete.
//!
//! ```text
//!  DOSING SCHEDULE ─┬─ Add ──▶ editor ─┬─ Days ──▶ day picker ──┐
//!                   │                  ├─ Time ◀─(hold)─ time picker
//!                   │                  ├─ Amount ◀─(hold)─ amount picker
//!                   │                  └─ Save / Cancel ──▶ back
//!                   ├─ View ──▶ pages of 6
//!                   ├─ Delete ──▶ list ──▶ Yes/No ──▶ list
//!                   └─ Delete All ──▶ Yes/No
//! ```
//!
//! The editor keeps the record in `ctx.draft_dose`; its days live in the
//! navigation scratch mask until Save copies them over.

use log::{info, warn};

use crate::days::DayMask;
use crate::schedule::DosingSchedule;

use super::context::{MenuContext, SlotChange};
use super::editors::{self, DAYS_FIELD};
use super::render::{Frame, Line, NoticeTone, fmt_line};
use super::{
    CONFIRM_NO, CONFIRM_YES, MenuDescriptor, MenuId, confirm_frame, page_count, page_span,
    push_items,
};

pub const MENU_ITEMS: &[&str] = &[
    "Add Schedule",
    "View Schedules",
    "Delete Schedule",
    "Delete All",
    "Back",
];

pub const EDITOR_FIELDS: &[&str] = &["Pump", "Days", "Time", "Amount", "Save", "Cancel"];

const PUMP: i32 = 0;
const TIME: i32 = 2;
const AMOUNT: i32 = 3;
const SAVE: i32 = 4;

const DELETE_ITEM: i32 = 2;
const DELETE_ALL_ITEM: i32 = 3;

// ═══════════════════════════════════════════════════════════════════════════
//  Dosing Schedule menu
// ═══════════════════════════════════════════════════════════════════════════

pub fn select_menu(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    match ctx.nav.selected {
        0 => {
            ctx.draft_dose = DosingSchedule::default();
            ctx.nav.day_mask = DayMask::NONE;
            ctx.nav.editing_hour = true;
            ctx.navigate_to(MenuId::DosingAdd, 0);
        }
        1 => {
            ctx.nav.page = 0;
            ctx.navigate_to(MenuId::DosingView, 0);
        }
        2 => ctx.navigate_to(MenuId::DosingDelete, 0),
        3 => ctx.navigate_to(MenuId::DosingDeleteAll, CONFIRM_NO),
        _ => ctx.navigate_to(MenuId::Scheduling, 0),
    }
}

/// One-line summary, e.g. `3 P2 08:05 1.5mL Mo-Fr`.
pub fn summary(index: usize, s: &DosingSchedule) -> Line {
    fmt_line(format_args!(
        "{} P{} {:02}:{:02} {}.{}mL {}",
        index + 1,
        s.pump,
        s.hour,
        s.minute,
        s.amount_dml / 10,
        s.amount_dml % 10,
        s.days.format_compact()
    ))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Editor
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_editor(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let nav = &ctx.nav;
    let d = &ctx.draft_dose;
    let mut frame = Frame::new(desc.title);

    frame.field(
        "Pump",
        fmt_line(format_args!("{}", d.pump)),
        editors::field_style(nav, PUMP, true),
    );
    frame.field(
        "Days",
        super::render::line(&nav.day_mask.format_short()),
        editors::field_style(nav, DAYS_FIELD, true),
    );
    let time = if nav.edit_mode && nav.selected == TIME {
        if nav.editing_hour {
            fmt_line(format_args!("[{:02}]:{:02}", d.hour, d.minute))
        } else {
            fmt_line(format_args!("{:02}:[{:02}]", d.hour, d.minute))
        }
    } else {
        editors::format_time(d.hour, d.minute)
    };
    frame.field("Time", time, editors::field_style(nav, TIME, true));
    frame.field(
        "Amount",
        editors::format_amount(d.amount_dml),
        editors::field_style(nav, AMOUNT, true),
    );
    frame.item("Save", nav.selected == SAVE);
    frame.item("Cancel", nav.selected == SAVE + 1);
    frame
}

pub fn editor_nav(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    editors::editor_navigate(ctx, desc.items.len() as i32, apply_delta);
}

fn apply_delta(ctx: &mut MenuContext, delta: i32) {
    let d = &mut ctx.draft_dose;
    match ctx.nav.selected {
        PUMP => d.pump = editors::step_pump(d.pump, delta),
        TIME if ctx.nav.editing_hour => d.hour = editors::step_hour(d.hour, delta),
        TIME => d.minute = editors::step_minute(d.minute, delta),
        AMOUNT => d.amount_dml = editors::step_amount(d.amount_dml, delta),
        _ => {}
    }
}

pub fn editor_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    match ctx.nav.selected {
        PUMP | AMOUNT => {
            if ctx.nav.edit_mode {
                ctx.exit_edit();
            } else {
                ctx.enter_edit();
            }
        }
        DAYS_FIELD => editors::open_day_picker(ctx, MenuId::DosingSelectDays),
        TIME => {
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
        _ => ctx.navigate_to(MenuId::DosingSchedule, 0),
    }
}

/// Long press opens the full-screen picker for Days, Time, or Amount.
pub fn editor_hold(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    if ctx.nav.edit_mode {
        ctx.exit_edit();
    }
    match ctx.nav.selected {
        DAYS_FIELD => editors::open_day_picker(ctx, MenuId::DosingSelectDays),
        TIME => {
            ctx.nav.editing_hour = true;
            ctx.navigate_to(MenuId::DosingSetTime, 0);
        }
        AMOUNT => ctx.navigate_to(MenuId::DosingSetAmount, 0),
        _ => super::hold_back(ctx, desc),
    }
}

fn save(ctx: &mut MenuContext) {
    let record = DosingSchedule {
        days: ctx.nav.day_mask,
        enabled: true,
        is_interval: false,
        interval_minutes: 0,
        ..ctx.draft_dose
    };
    match ctx.store.dosing.add(record) {
        Ok(index) => {
            info!(
                "Dosing schedule {} saved: pump {} at {:02}:{:02}, {} dmL, {}",
                index, record.pump, record.hour, record.minute, record.amount_dml, record.days
            );
            ctx.request_persist();
            ctx.post_notice("SAVED!", NoticeTone::Success);
            ctx.navigate_to(MenuId::DosingSchedule, 0);
        }
        Err(e) => {
            warn!("Dosing schedule rejected: {e}");
            ctx.post_notice(e.notice_text(), NoticeTone::Warning);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Full-screen pickers
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_time_picker(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let d = &ctx.draft_dose;
    let mut frame = Frame::new(desc.title);
    frame.text_fmt(format_args!("Hour:   {:02}", d.hour));
    frame.text_fmt(format_args!("Minute: {:02}", d.minute));
    frame.blank();
    frame.item("Hour", ctx.nav.editing_hour);
    frame.item("Minute", !ctx.nav.editing_hour);
    frame
}

pub fn time_picker_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let delta = ctx.take_delta();
    if delta == 0 {
        return;
    }
    let d = &mut ctx.draft_dose;
    if ctx.nav.editing_hour {
        d.hour = editors::step_hour(d.hour, delta);
    } else {
        d.minute = editors::step_minute(d.minute, delta);
    }
}

/// Hour, then minute, then back to the editor.
pub fn time_picker_select(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    if ctx.nav.editing_hour {
        ctx.nav.editing_hour = false;
        ctx.nav.needs_redraw = true;
    } else {
        time_picker_hold(ctx, desc);
    }
}

pub fn time_picker_hold(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    ctx.nav.editing_hour = true;
    ctx.navigate_to(desc.back, TIME);
}

pub fn draw_amount_picker(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    frame.text_fmt(format_args!("Pump {}", ctx.draft_dose.pump));
    frame.blank();
    frame.field(
        "Amount",
        editors::format_amount(ctx.draft_dose.amount_dml),
        super::render::FieldStyle::Editing,
    );
    frame.blank();
    frame.text("Press to confirm");
    frame
}

pub fn amount_picker_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let delta = ctx.take_delta();
    if delta != 0 {
        ctx.draft_dose.amount_dml = editors::step_amount(ctx.draft_dose.amount_dml, delta);
    }
}

pub fn amount_picker_done(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    ctx.navigate_to(desc.back, AMOUNT);
}

// ═══════════════════════════════════════════════════════════════════════════
//  View
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_view(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let list = &ctx.store.dosing;
    let mut frame = Frame::new(desc.title);
    if list.is_empty() {
        frame.text("No schedules");
        return frame;
    }
    let page = ctx.nav.page.max(0) as usize;
    let span = page_span(page * super::PAGE_SIZE, list.len());
    for (i, s) in list.iter().enumerate().skip(span.start).take(span.len()) {
        frame.push(super::render::Row::Text(summary(i, s)));
    }
    frame.blank();
    frame.text_fmt(format_args!("Page {}/{}", page + 1, page_count(list.len())));
    frame
}

/// The encoder picks the page; any press returns.
pub fn view_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    ctx.nav.page = ctx.clamp_cursor(page_count(ctx.store.dosing.len()) as i32);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Delete
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_delete(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let list = &ctx.store.dosing;
    let entries = list.len() + 1;
    let selected = ctx.nav.selected.max(0) as usize;
    let mut frame = Frame::new(desc.title);
    for i in page_span(selected, entries) {
        match list.get(i) {
            Some(s) => frame.item(&summary(i, s), i == selected),
            None => frame.item("Return to Menu", i == selected),
        }
    }
    frame
}

/// Records plus the trailing "Return to Menu" row.
pub fn delete_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    ctx.clamp_cursor(ctx.store.dosing.len() as i32 + 1);
}

pub fn delete_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let selected = ctx.nav.selected.max(0) as usize;
    if selected < ctx.store.dosing.len() {
        ctx.nav.temp_index = Some(selected);
        ctx.navigate_to(MenuId::DosingDeleteConfirm, CONFIRM_NO);
    } else {
        ctx.navigate_to(MenuId::DosingSchedule, DELETE_ITEM);
    }
}

pub fn draw_delete_confirm(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let index = ctx.nav.temp_index.unwrap_or(0);
    let message = fmt_line(format_args!("Delete schedule {}?", index + 1));
    let mut frame = Frame::dialog(desc.title, &message);
    if let Some(s) = ctx.store.dosing.get(index) {
        frame.push(super::render::Row::Text(summary(index, s)));
    }
    push_items(&mut frame, ctx, desc);
    frame
}

pub fn delete_confirm_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let index = ctx.nav.temp_index.take();
    if ctx.nav.selected == CONFIRM_YES {
        let removed = index.and_then(|i| ctx.store.dosing.remove(i).map(|r| (i, r)));
        if let Some((i, removed)) = removed {
            info!(
                "Dosing schedule {} deleted (pump {}), {} remain",
                i,
                removed.pump,
                ctx.store.dosing.len()
            );
            ctx.request_slot_change(SlotChange::Removed(i));
            ctx.post_notice("DELETED!", NoticeTone::Success);
        }
    }
    let back = index.unwrap_or(0).min(ctx.store.dosing.len());
    ctx.navigate_to(MenuId::DosingDelete, back as i32);
}

pub fn draw_delete_all(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let message = fmt_line(format_args!("Delete all {} dosing?", ctx.store.dosing.len()));
    confirm_frame(ctx, desc, &message)
}

pub fn delete_all_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    if ctx.nav.selected == CONFIRM_YES {
        info!("All {} dosing schedules deleted", ctx.store.dosing.len());
        ctx.store.dosing.clear();
        ctx.request_slot_change(SlotChange::Cleared);
        ctx.post_notice("ALL DELETED!", NoticeTone::Success);
        ctx.navigate_to(MenuId::DosingSchedule, 0);
    } else {
        ctx.navigate_to(MenuId::DosingSchedule, DELETE_ALL_ITEM);
    }
}
