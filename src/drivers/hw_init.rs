//! Board bring-up for the controller.
//!
//! Encoder inputs, relay and LED outputs, four pump LEDC channels, and the
//! per-pin interrupt service, all through raw ESP-IDF sys calls.  `main()`
//! calls [`bring_up`] once.  A stage that fails is logged and only its
//! subsystem is marked down in the returned [`HardwareHealth`].
//!
//! On the host the register accessors are inert: reads see an idle
//! (high, pulled-up) line and writes go nowhere.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::HardwareHealth;

/// Raw `esp_err_t` of the first failing bring-up call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "gpio_config returned {}", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC pump channel setup returned {}", rc),
            Self::IsrInstallFailed(rc) => write!(f, "gpio_install_isr_service returned {}", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::{error, info};

#[cfg(target_os = "espidf")]
use crate::pins;

/// Configure outputs first so relays are driven low as early as possible,
/// then pumps, then the encoder and its interrupts.
#[cfg(target_os = "espidf")]
pub fn bring_up() -> HardwareHealth {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    let (outputs, pumps, gpio_in) = unsafe {
        (
            report(init_gpio_outputs()),
            report(init_ledc()),
            report(init_gpio_inputs()),
        )
    };
    let health = HardwareHealth {
        input: gpio_in && report(init_isr_service()),
        outputs,
        pumps,
    };
    if !health.is_degraded() {
        info!("hw_init: encoder, relays, LEDs and pumps ready");
    }
    health
}

#[cfg(not(target_os = "espidf"))]
pub fn bring_up() -> HardwareHealth {
    log::info!("hw_init: host build, no peripherals to configure");
    HardwareHealth::ALL_UP
}

#[cfg(target_os = "espidf")]
fn report(stage: Result<(), HwInitError>) -> bool {
    match stage {
        Ok(()) => true,
        Err(e) => {
            error!("hw_init: {} ({}), subsystem left inert", crate::error::Error::from(e), e);
            false
        }
    }
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as esp_err_t { Ok(()) } else { Err(err(ret)) }
}

// ── Encoder inputs ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let mask = (1u64 << pins::ENCODER_CLK_GPIO)
        | (1u64 << pins::ENCODER_DT_GPIO)
        | (1u64 << pins::ENCODER_SW_GPIO);
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;

    info!("hw_init: encoder inputs configured (CLK={}, DT={}, SW={})",
        pins::ENCODER_CLK_GPIO, pins::ENCODER_DT_GPIO, pins::ENCODER_SW_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access; safe from
    // both main and interrupt context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── Relay and LED outputs ─────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // Relays and LEDs both boot LOW (relays open, LEDs dark).
    for &pin in pins::RELAY_GPIOS.iter().chain(pins::LED_GPIOS.iter()) {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: relay and LED outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes an already-configured output pin;
    // main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── Pump PWM ──────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0 shared by all four pumps.
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::PUMP_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&timer) }, HwInitError::LedcInitFailed)?;

    for (i, &gpio) in pins::PUMP_GPIOS.iter().enumerate() {
        let channel = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: ledc_channel_t_LEDC_CHANNEL_0 + i as u32,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        check(unsafe { ledc_channel_config(&channel) }, HwInitError::LedcInitFailed)?;
    }

    info!("hw_init: LEDC configured (pumps=CH0-3, {} Hz, {}-bit)",
        pins::PUMP_PWM_FREQ_HZ, pins::PWM_RESOLUTION_BITS);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); only the main
    // loop writes duty registers.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── Encoder interrupts ────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::{button::button_isr_handler, encoder::encoder_isr_handler};

#[cfg(target_os = "espidf")]
fn isr_now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    (unsafe { esp_timer_get_time() } / 1_000) as u32
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn encoder_gpio_isr(_arg: *mut core::ffi::c_void) {
    let a = gpio_read(pins::ENCODER_CLK_GPIO);
    let b = gpio_read(pins::ENCODER_DT_GPIO);
    encoder_isr_handler(a, b, isr_now_ms());
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn switch_gpio_isr(_arg: *mut core::ffi::c_void) {
    button_isr_handler(gpio_read(pins::ENCODER_SW_GPIO), isr_now_ms());
}

/// Install the per-pin GPIO ISR service and register the encoder handlers.
#[cfg(target_os = "espidf")]
fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: a second install reports ESP_ERR_INVALID_STATE and is
    // harmless.  The handlers only store into atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        // Seed the decoder with the resting levels before enabling edges.
        crate::drivers::encoder::ENCODER.seed(
            gpio_read(pins::ENCODER_CLK_GPIO),
            gpio_read(pins::ENCODER_DT_GPIO),
        );

        for pin in [pins::ENCODER_CLK_GPIO, pins::ENCODER_DT_GPIO] {
            gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE);
            gpio_isr_handler_add(pin, Some(encoder_gpio_isr), core::ptr::null_mut());
            gpio_intr_enable(pin);
        }

        gpio_set_intr_type(pins::ENCODER_SW_GPIO, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        gpio_isr_handler_add(pins::ENCODER_SW_GPIO, Some(switch_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::ENCODER_SW_GPIO);

        info!("hw_init: ISR service installed (encoder A/B, switch)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_bring_up_reports_everything_up() {
        assert!(!bring_up().is_degraded());
    }
}
