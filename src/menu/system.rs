//! Main menu, pump screens, solution records, and reset dialogs.

use log::info;

use crate::app::commands::AppCommand;
use crate::days::DAY_NAMES;
use crate::error::DoseError;

use super::context::MenuContext;
use super::editors;
use super::render::{Frame, NoticeTone, fmt_line};
use super::{CONFIRM_NO, CONFIRM_YES, MenuDescriptor, MenuId, confirm_frame, push_items};

// ═══════════════════════════════════════════════════════════════════════════
//  Main menu
// ═══════════════════════════════════════════════════════════════════════════

pub const MAIN_ITEMS: &[&str] = &[
    "Scheduling",
    "Manual Dosing",
    "Pump Calibration",
    "Top-up Solution",
    "Replace Solution",
    "Reset WiFi",
    "Factory Reset",
];

const RESET_WIFI_ITEM: i32 = 5;
const FACTORY_RESET_ITEM: i32 = 6;

fn indicator(up: bool) -> &'static str {
    if up { "OK" } else { "--" }
}

pub fn draw_main(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    match &ctx.clock {
        Some(c) => {
            let day = DAY_NAMES.get(usize::from(c.weekday)).copied().unwrap_or("???");
            frame.text_fmt(format_args!(
                "{:04}-{:02}-{:02} {} {:02}:{:02}:{:02}",
                c.year,
                c.month,
                c.day,
                day.get(..3).unwrap_or(day),
                c.hour,
                c.minute,
                c.second
            ));
        }
        None => frame.text("RTC?"),
    }
    frame.text_fmt(format_args!(
        "WiFi:{} MQTT:{}{}",
        indicator(ctx.network.wifi_connected),
        indicator(ctx.network.mqtt_connected),
        if ctx.health.is_degraded() { " HW!" } else { "" }
    ));
    push_items(&mut frame, ctx, desc);
    frame.blank();
    match &ctx.network.ip {
        Some(ip) => frame.text_fmt(format_args!("IP: {ip}")),
        None => frame.text("IP: N/A"),
    }
    frame
}

pub fn select_main(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    match ctx.nav.selected {
        0 => ctx.navigate_to(MenuId::Scheduling, 0),
        1 => {
            ctx.nav.temp_pump = 1;
            ctx.nav.temp_amount = 10;
            ctx.navigate_to(MenuId::ManualDosing, 0);
        }
        2 => ctx.navigate_to(MenuId::PumpCalibration, 0),
        3 => ctx.navigate_to(MenuId::TopUpSolution, 0),
        4 => ctx.navigate_to(MenuId::ReplaceSolution, 0),
        RESET_WIFI_ITEM => ctx.navigate_to(MenuId::ResetWifiConfirm, CONFIRM_NO),
        FACTORY_RESET_ITEM => ctx.navigate_to(MenuId::FactoryResetConfirm, CONFIRM_NO),
        _ => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Manual dosing
// ═══════════════════════════════════════════════════════════════════════════

pub const MANUAL_FIELDS: &[&str] = &["Pump", "Amount", "Start", "Cancel"];

const MANUAL_PUMP: i32 = 0;
const MANUAL_AMOUNT: i32 = 1;
const MANUAL_START: i32 = 2;

pub fn draw_manual(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let nav = &ctx.nav;
    let mut frame = Frame::new(desc.title);
    frame.field(
        "Pump",
        fmt_line(format_args!("{}", nav.temp_pump)),
        editors::field_style(nav, MANUAL_PUMP, true),
    );
    frame.field(
        "Amount",
        editors::format_amount(nav.temp_amount),
        editors::field_style(nav, MANUAL_AMOUNT, true),
    );
    frame.item("Start", nav.selected == MANUAL_START);
    frame.item("Cancel", nav.selected == MANUAL_START + 1);
    if ctx.pumps_busy {
        frame.blank();
        frame.text("Pump running...");
    }
    frame
}

pub fn manual_nav(ctx: &mut MenuContext, desc: &MenuDescriptor) {
    editors::editor_navigate(ctx, desc.items.len() as i32, |ctx, delta| {
        match ctx.nav.selected {
            MANUAL_PUMP => ctx.nav.temp_pump = editors::step_pump(ctx.nav.temp_pump, delta),
            MANUAL_AMOUNT => {
                ctx.nav.temp_amount = editors::step_amount(ctx.nav.temp_amount, delta)
            }
            _ => {}
        }
    });
}

pub fn manual_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    match ctx.nav.selected {
        MANUAL_PUMP | MANUAL_AMOUNT => {
            if ctx.nav.edit_mode {
                ctx.exit_edit();
            } else {
                ctx.enter_edit();
            }
        }
        MANUAL_START => {
            if ctx.nav.temp_amount == 0 {
                ctx.post_notice(DoseError::ZeroAmount.notice_text(), NoticeTone::Warning);
                return;
            }
            ctx.request_command(AppCommand::ManualDose {
                pump: ctx.nav.temp_pump,
                amount_dml: ctx.nav.temp_amount,
            });
        }
        _ => ctx.navigate_to(MenuId::Main, 1),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Calibration
// ═══════════════════════════════════════════════════════════════════════════

pub const CALIBRATION_ITEMS: &[&str] = &[
    "Calibrate Pump 1",
    "Calibrate Pump 2",
    "Calibrate Pump 3",
    "Calibrate Pump 4",
    "Back",
];

pub const CALIBRATE_ITEMS: &[&str] = &["Start Calibration", "Cancel"];

pub fn select_calibration(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let selected = ctx.nav.selected;
    if (0..4).contains(&selected) {
        ctx.nav.temp_pump = selected as u8 + 1;
        ctx.navigate_to(MenuId::CalibratePump, 0);
    } else {
        ctx.navigate_to(MenuId::Main, 2);
    }
}

pub fn draw_calibrate(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let pump = ctx.nav.temp_pump;
    let mut frame = Frame::new(desc.title);
    match ctx.aux.calibrations.for_pump(pump) {
        Some(cal) => {
            frame.text_fmt(format_args!("Pump {pump}"));
            frame.text_fmt(format_args!("Rate: {:.2} mL/s", cal.ml_per_second));
            frame.text_fmt(format_args!("Duty: {}%", cal.pwm_percent));
            frame.text_fmt(format_args!("Run:  {} ms", cal.time_ms));
            frame.text(if cal.is_calibrated {
                "Status: Calibrated"
            } else {
                "Status: Not calibrated"
            });
        }
        None => frame.text_fmt(format_args!("Pump {pump} unknown")),
    }
    frame.blank();
    push_items(&mut frame, ctx, desc);
    frame
}

pub fn calibrate_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    let pump = ctx.nav.temp_pump;
    if ctx.nav.selected == 0 {
        ctx.request_command(AppCommand::CalibrationRun { pump });
    } else {
        ctx.navigate_to(MenuId::PumpCalibration, i32::from(pump.saturating_sub(1)));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Top-up / replace (read-only)
// ═══════════════════════════════════════════════════════════════════════════

fn pump_amounts(frame: &mut Frame, amounts: &[u16; 4]) {
    for (i, dml) in amounts.iter().enumerate() {
        frame.text_fmt(format_args!("Pump {}: {}", i + 1, editors::format_amount(*dml)));
    }
}

fn enabled_row(frame: &mut Frame, enabled: bool) {
    frame.blank();
    frame.text(if enabled { "Enabled" } else { "Disabled" });
}

pub fn draw_top_up_amounts(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    pump_amounts(&mut frame, &ctx.aux.top_up.pump_dml);
    enabled_row(&mut frame, ctx.aux.top_up.enabled);
    frame
}

pub fn draw_top_up_relay(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    frame.text_fmt(format_args!("Fill relay: {}", ctx.aux.top_up.fill_relay));
    frame
}

pub fn draw_replace_amounts(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    pump_amounts(&mut frame, &ctx.aux.replace.pump_dml);
    enabled_row(&mut frame, ctx.aux.replace.enabled);
    frame
}

pub fn draw_replace_drain(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    frame.text_fmt(format_args!("Drain relay: {}", ctx.aux.replace.drain_relay));
    frame
}

pub fn draw_replace_fill(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let mut frame = Frame::new(desc.title);
    frame.text_fmt(format_args!("Fill relay: {}", ctx.aux.replace.fill_relay));
    frame
}

pub fn draw_replace_schedule(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    let r = &ctx.aux.replace;
    let day = DAY_NAMES
        .get(usize::from(r.schedule_day))
        .copied()
        .unwrap_or("?");
    let mut frame = Frame::new(desc.title);
    frame.text_fmt(format_args!("Day:  {day}"));
    frame.text_fmt(format_args!("Hour: {:02}:00", r.schedule_hour));
    enabled_row(&mut frame, r.enabled);
    frame
}

// ═══════════════════════════════════════════════════════════════════════════
//  Reset dialogs
// ═══════════════════════════════════════════════════════════════════════════

pub fn draw_reset_wifi(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    confirm_frame(ctx, desc, "Erase WiFi settings?")
}

pub fn reset_wifi_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    if ctx.nav.selected == CONFIRM_YES {
        info!("WiFi reset confirmed");
        ctx.request_command(AppCommand::ResetWifi);
        ctx.post_notice("RESTARTING...", NoticeTone::Warning);
        ctx.navigate_to(MenuId::Main, 0);
    } else {
        ctx.navigate_to(MenuId::Main, RESET_WIFI_ITEM);
    }
}

pub fn draw_factory_reset(ctx: &MenuContext, desc: &MenuDescriptor) -> Frame {
    confirm_frame(ctx, desc, "Erase ALL settings?")
}

pub fn factory_reset_select(ctx: &mut MenuContext, _desc: &MenuDescriptor) {
    if ctx.nav.selected == CONFIRM_YES {
        info!("Factory reset confirmed");
        ctx.request_command(AppCommand::FactoryReset);
        ctx.post_notice("RESTARTING...", NoticeTone::Warning);
        ctx.navigate_to(MenuId::Main, 0);
    } else {
        ctx.navigate_to(MenuId::Main, FACTORY_RESET_ITEM);
    }
}
