//! Encoder input adapter.
//!
//! Implements [`InputPort`] over the ISR-written [`EncoderCell`] and the
//! push-switch [`ButtonDriver`].  [`EncoderInput::poll`] must run once
//! per control tick before the service reads the port; it classifies
//! switch gestures and latches them into pending flags that
//! `take_press` / `take_long_press` swap-and-clear.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::app::ports::InputPort;
use crate::drivers::button::{ButtonDriver, ButtonEvent};
use crate::drivers::encoder::{ENCODER, EncoderCell};

pub struct EncoderInput {
    cell: &'static EncoderCell,
    button: ButtonDriver,
    press: AtomicBool,
    long_press: AtomicBool,
    /// Position returned by the last `position()` call.
    seen: AtomicI32,
}

impl EncoderInput {
    /// Adapter over the board encoder.
    pub fn new(button: ButtonDriver) -> Self {
        Self::with_cell(&ENCODER, button)
    }

    pub fn with_cell(cell: &'static EncoderCell, button: ButtonDriver) -> Self {
        Self {
            cell,
            button,
            press: AtomicBool::new(false),
            long_press: AtomicBool::new(false),
            seen: AtomicI32::new(cell.position()),
        }
    }

    /// Run the switch state machine against the ISR-published level.
    pub fn poll(&mut self, now_ms: u32) {
        let event = self.button.tick(now_ms);
        self.latch(event);
    }

    /// Run the switch state machine against an explicit level.
    pub fn poll_level(&mut self, now_ms: u32, down: bool) {
        let event = self.button.step(now_ms, down);
        self.latch(event);
    }

    pub fn button_mut(&mut self) -> &mut ButtonDriver {
        &mut self.button
    }

    fn latch(&self, event: Option<ButtonEvent>) {
        match event {
            Some(ButtonEvent::Press) => self.press.store(true, Ordering::Release),
            Some(ButtonEvent::LongPress) => self.long_press.store(true, Ordering::Release),
            None => {}
        }
    }
}

impl InputPort for EncoderInput {
    fn position(&self) -> i32 {
        let position = self.cell.position();
        self.seen.store(position, Ordering::Relaxed);
        position
    }

    fn set_position(&mut self, position: i32) {
        self.cell.rebase(self.seen.load(Ordering::Relaxed), position);
        self.seen.store(position, Ordering::Relaxed);
    }

    fn take_press(&mut self) -> bool {
        self.press.swap(false, Ordering::AcqRel)
    }

    fn take_long_press(&mut self) -> bool {
        self.long_press.swap(false, Ordering::AcqRel)
    }
}
