//! Encoder push-switch driver with short and long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with internal pull-up.  The GPIO fires on
//! any edge; the ISR stores the pin level and a timestamp into atomics,
//! and [`ButtonDriver::tick`] (called from the main loop once per tick)
//! runs the debounce + gesture state machine.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                                  | Event        |
//! |-------------|--------------------------------------------|--------------|
//! | Short press | Released before the long-press threshold   | `Press`      |
//! | Long press  | Held for at least the long-press threshold | `LongPress`  |
//!
//! A press edge arriving within the debounce window of the previous
//! accepted press is dropped.  A long press fires while still held and
//! suppresses the short press on release.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const DEFAULT_DEBOUNCE_MS: u32 = 200;
pub const DEFAULT_LONG_PRESS_MS: u32 = 1_000;

/// Pin level as last seen by the ISR (`true` = switch closed).
static BUTTON_DOWN: AtomicBool = AtomicBool::new(false);
/// Timestamp of the last ISR edge.
static BUTTON_EDGE_MS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Released,
    Down { since_ms: u32 },
    /// Long press already reported; wait for release.
    Held,
}

pub struct ButtonDriver {
    state: GestureState,
    last_accept_ms: Option<u32>,
    debounce_ms: u32,
    long_press_ms: u32,
}

impl ButtonDriver {
    pub fn new(debounce_ms: u32, long_press_ms: u32) -> Self {
        Self {
            state: GestureState::Released,
            last_accept_ms: None,
            debounce_ms,
            long_press_ms,
        }
    }

    pub fn set_timing(&mut self, debounce_ms: u32, long_press_ms: u32) {
        self.debounce_ms = debounce_ms;
        self.long_press_ms = long_press_ms;
    }

    /// Run the state machine against the ISR-published pin level.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        self.step(now_ms, BUTTON_DOWN.load(Ordering::Acquire))
    }

    /// Run the state machine against an explicit pin level.
    pub fn step(&mut self, now_ms: u32, down: bool) -> Option<ButtonEvent> {
        match self.state {
            GestureState::Released => {
                if down && self.debounced(now_ms) {
                    self.last_accept_ms = Some(now_ms);
                    self.state = GestureState::Down { since_ms: now_ms };
                }
                None
            }
            GestureState::Down { since_ms } => {
                if !down {
                    self.state = GestureState::Released;
                    return Some(ButtonEvent::Press);
                }
                if now_ms.wrapping_sub(since_ms) >= self.long_press_ms {
                    self.state = GestureState::Held;
                    return Some(ButtonEvent::LongPress);
                }
                None
            }
            GestureState::Held => {
                if !down {
                    self.state = GestureState::Released;
                }
                None
            }
        }
    }

    fn debounced(&self, now_ms: u32) -> bool {
        self.last_accept_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) > self.debounce_ms)
    }
}

impl Default for ButtonDriver {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS, DEFAULT_LONG_PRESS_MS)
    }
}

/// ISR handler; register on the switch GPIO for any edge.
/// `level_high` is the raw pin level; the switch is active-low.
#[allow(unused)]
pub fn button_isr_handler(level_high: bool, now_ms: u32) {
    BUTTON_DOWN.store(!level_high, Ordering::Release);
    BUTTON_EDGE_MS.store(now_ms, Ordering::Release);
}

/// Timestamp of the most recent switch edge, for activity tracking.
pub fn last_edge_ms() -> u32 {
    BUTTON_EDGE_MS.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_events_while_released() {
        let mut btn = ButtonDriver::default();
        assert_eq!(btn.step(100, false), None);
        assert_eq!(btn.step(200, false), None);
    }

    #[test]
    fn short_press_fires_on_release() {
        let mut btn = ButtonDriver::default();
        assert_eq!(btn.step(1_000, true), None);
        assert_eq!(btn.step(1_050, true), None);
        assert_eq!(btn.step(1_100, false), Some(ButtonEvent::Press));
    }

    #[test]
    fn long_press_fires_while_held_and_only_once() {
        let mut btn = ButtonDriver::default();
        btn.step(1_000, true);
        assert_eq!(btn.step(1_999, true), None);
        assert_eq!(btn.step(2_000, true), Some(ButtonEvent::LongPress));
        assert_eq!(btn.step(2_500, true), None);
        assert_eq!(btn.step(2_600, false), None);
    }

    #[test]
    fn second_press_inside_debounce_is_dropped() {
        let mut btn = ButtonDriver::default();
        btn.step(1_000, true);
        assert_eq!(btn.step(1_020, false), Some(ButtonEvent::Press));
        // Bounce 150 ms after the accepted press.
        btn.step(1_150, true);
        assert_eq!(btn.step(1_160, false), None);
        btn.step(1_300, true);
        assert_eq!(btn.step(1_320, false), Some(ButtonEvent::Press));
    }

    #[test]
    fn isr_level_is_inverted() {
        button_isr_handler(false, 42);
        assert!(BUTTON_DOWN.load(Ordering::SeqCst));
        assert_eq!(last_edge_ms(), 42);
        button_isr_handler(true, 43);
        assert!(!BUTTON_DOWN.load(Ordering::SeqCst));
    }
}
