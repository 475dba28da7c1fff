//! Inline field editors.
//!
//! Pure delta helpers for every editable field, the value formatters the
//! editor screens share, and the day-picker sub-screen that both schedule
//! editors invoke.  The picker returns to its descriptor's `back` menu on
//! the Days field.

use crate::days::{DAY_COUNT, DAY_NAMES};
use crate::schedule::{MAX_DOSE_DML, PUMP_COUNT, RELAY_COUNT};

use super::MenuDescriptor;
use super::context::{DAY_CURSOR_DONE, MenuContext, NavState};
use super::render::{FieldStyle, Frame, Line, fmt_line};

/// Index of the Days field in both schedule editors.
pub const DAYS_FIELD: i32 = 1;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Wrap `value` into `[min, max]`.
pub fn wrap(value: i32, min: i32, max: i32) -> i32 {
    min + (value - min).rem_euclid(max - min + 1)
}

pub fn step_pump(pump: u8, delta: i32) -> u8 {
    wrap(i32::from(pump) + delta, 1, i32::from(PUMP_COUNT)) as u8
}

pub fn step_day_cursor(cursor: u8, delta: i32) -> u8 {
    wrap(i32::from(cursor) + delta, 0, i32::from(DAY_CURSOR_DONE)) as u8
}

pub fn step_hour(hour: u8, delta: i32) -> u8 {
    wrap(i32::from(hour) + delta, 0, 23) as u8
}

/// Minutes move in 5-minute steps.
pub fn step_minute(minute: u8, delta: i32) -> u8 {
    wrap(i32::from(minute) + delta * 5, 0, 59) as u8
}

/// Unscaled; leaving the range jumps to the opposite end.
pub fn step_amount(amount_dml: u16, delta: i32) -> u16 {
    let next = i32::from(amount_dml) + delta;
    if next < 0 {
        MAX_DOSE_DML
    } else if next > i32::from(MAX_DOSE_DML) {
        0
    } else {
        next as u16
    }
}

pub fn clamp_relay(relay: u8, delta: i32) -> u8 {
    (i32::from(relay) + delta).clamp(1, i32::from(RELAY_COUNT)) as u8
}

pub fn clamp_hour(hour: u8, delta: i32) -> u8 {
    (i32::from(hour) + delta).clamp(0, 23) as u8
}

pub fn clamp_minute(minute: u8, delta: i32) -> u8 {
    (i32::from(minute) + delta).clamp(0, 59) as u8
}

pub const fn interval_max(in_hours: bool) -> u8 {
    if in_hours { 24 } else { 59 }
}

pub fn clamp_interval(value: u8, delta: i32, in_hours: bool) -> u8 {
    (i32::from(value) + delta).clamp(1, i32::from(interval_max(in_hours))) as u8
}

/// Split stored minutes into the editor's unit and value.
pub fn interval_seed(minutes: u16) -> (bool, u8) {
    if minutes >= 60 {
        (true, (minutes / 60).clamp(1, 24) as u8)
    } else {
        (false, minutes.max(1) as u8)
    }
}

pub fn interval_minutes(in_hours: bool, value: u8) -> u16 {
    if in_hours {
        u16::from(value) * 60
    } else {
        u16::from(value)
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn format_time(hour: u8, minute: u8) -> Line {
    fmt_line(format_args!("{hour:02}:{minute:02}"))
}

pub fn format_amount(amount_dml: u16) -> Line {
    fmt_line(format_args!("{}.{} mL", amount_dml / 10, amount_dml % 10))
}

pub fn format_interval(minutes: u16) -> Line {
    if minutes >= 60 && minutes % 60 == 0 {
        fmt_line(format_args!("Every {} h", minutes / 60))
    } else {
        fmt_line(format_args!("Every {minutes} min"))
    }
}

/// Style for editor field `index`.  `editable = false` renders it grayed.
pub fn field_style(nav: &NavState, index: i32, editable: bool) -> FieldStyle {
    if nav.selected == index {
        if nav.edit_mode {
            FieldStyle::Editing
        } else {
            FieldStyle::Selected
        }
    } else if editable {
        FieldStyle::Normal
    } else {
        FieldStyle::Inactive
    }
}

/// Clamp the field cursor, or hand the delta to `apply` while editing.
pub fn editor_navigate(ctx: &mut MenuContext, field_count: i32, apply: fn(&mut MenuContext, i32)) {
    if ctx.nav.edit_mode {
        let delta = ctx.take_delta();
        if delta != 0 {
            apply(ctx, delta);
        }
    } else {
        ctx.clamp_cursor(field_count);
    }
}

// ---------------------------------------------------------------------------
// Day picker
// ---------------------------------------------------------------------------

/// Open the day picker with the cursor on Sunday.
pub fn open_day_picker(ctx: &mut MenuContext, picker: super::MenuId) {
    ctx.nav.day_cursor = 0;
    ctx.navigate_to(picker, 0);
}

pub fn draw_day_picker(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    for day in 0..DAY_COUNT {
        let mark = if ctx.nav.day_mask.is_set(day) { 'x' } else { ' ' };
        let text = fmt_line(format_args!("[{mark}] {}", DAY_NAMES[usize::from(day)]));
        frame.item(&text, ctx.nav.day_cursor == day);
    }
    frame.item("Done", ctx.nav.day_cursor == DAY_CURSOR_DONE);
    frame
}

pub fn day_picker_nav(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let delta = ctx.take_delta();
    if delta != 0 {
        ctx.nav.day_cursor = step_day_cursor(ctx.nav.day_cursor, delta);
        ctx.nav.selected = i32::from(ctx.nav.day_cursor);
    }
}

pub fn day_picker_select(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    if ctx.nav.day_cursor == DAY_CURSOR_DONE {
        ctx.navigate_to(desc.back, DAYS_FIELD);
    } else {
        ctx.nav.day_mask.toggle(ctx.nav.day_cursor);
        ctx.nav.needs_redraw = true;
    }
}

/// Long press keeps the toggled days and returns like Done.
pub fn day_picker_hold(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    ctx.navigate_to(desc.back, DAYS_FIELD);
}
