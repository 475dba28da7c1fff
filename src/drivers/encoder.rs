//! Quadrature rotary encoder decoded in interrupt context.
//!
//! Both encoder channels interrupt on any edge.  The ISR reads the two
//! pin levels, looks the (previous, current) pair up in the Gray-code
//! transition table and accumulates sub-steps; every
//! [`PULSES_PER_DETENT`] valid transitions in one direction move the
//! shared position by one.  After a step is emitted, further edges are
//! ignored for [`STEP_DEBOUNCE_MS`] to swallow contact bounce.
//!
//! The main loop only reads the position or shifts it with
//! [`EncoderCell::rebase`]; it never stores over it, so a detent the ISR
//! adds in between is kept.

use core::sync::atomic::{AtomicI32, AtomicU8, AtomicU32, Ordering};

/// Valid transitions per mechanical detent.
pub const PULSES_PER_DETENT: i32 = 2;
/// Quiet time after an emitted step.
pub const STEP_DEBOUNCE_MS: u32 = 5;

/// Direction of one 2-bit Gray-code transition.
///
/// `prev` and `curr` are `(B << 1) | A`.  Returns `-1`, `+1`, or `0` for
/// no movement and for illegal double-bit jumps.
pub fn transition(prev: u8, curr: u8) -> i32 {
    match ((prev & 0b11) << 2) | (curr & 0b11) {
        0b1101 | 0b0100 | 0b0010 | 0b1011 => -1,
        0b1110 | 0b0111 | 0b0001 | 0b1000 => 1,
        _ => 0,
    }
}

/// Interrupt-shared encoder state.
pub struct EncoderCell {
    position: AtomicI32,
    last_ab: AtomicU8,
    pulses: AtomicI32,
    last_step_ms: AtomicU32,
}

impl EncoderCell {
    pub const fn new() -> Self {
        Self {
            position: AtomicI32::new(0),
            last_ab: AtomicU8::new(0),
            pulses: AtomicI32::new(0),
            last_step_ms: AtomicU32::new(0),
        }
    }

    /// Record one edge on either channel.  `a` is CLK, `b` is DT.
    ///
    /// Single producer: only the encoder ISR calls this.
    pub fn on_edge(&self, a: bool, b: bool, now_ms: u32) {
        let ab = (u8::from(b) << 1) | u8::from(a);
        let prev = self.last_ab.swap(ab, Ordering::Relaxed);

        let last_step = self.last_step_ms.load(Ordering::Relaxed);
        if last_step != 0 && now_ms.wrapping_sub(last_step) < STEP_DEBOUNCE_MS {
            return;
        }

        let dir = transition(prev, ab);
        if dir == 0 {
            return;
        }
        let mut pulses = self.pulses.load(Ordering::Relaxed);
        // A reversal discards the half-step accumulated the other way.
        if pulses.signum() == -dir {
            pulses = 0;
        }
        pulses += dir;
        if pulses.abs() >= PULSES_PER_DETENT {
            self.position.fetch_add(dir, Ordering::Release);
            self.last_step_ms.store(now_ms.max(1), Ordering::Relaxed);
            pulses = 0;
        }
        self.pulses.store(pulses, Ordering::Relaxed);
    }

    /// Seed the decoder with the current pin levels so the first edge
    /// after boot is decoded against the real resting state.
    pub fn seed(&self, a: bool, b: bool) {
        self.last_ab
            .store((u8::from(b) << 1) | u8::from(a), Ordering::Relaxed);
    }

    pub fn position(&self) -> i32 {
        self.position.load(Ordering::Acquire)
    }

    /// Move the detent count from `seen` (the last value read) to
    /// `position` and drop any half-finished detent.  Steps the ISR
    /// emitted since `seen` was read stay on top of `position`.
    pub fn rebase(&self, seen: i32, position: i32) {
        self.pulses.store(0, Ordering::Relaxed);
        self.position
            .fetch_add(position.wrapping_sub(seen), Ordering::AcqRel);
    }
}

impl Default for EncoderCell {
    fn default() -> Self {
        Self::new()
    }
}

/// The board's single encoder, written by the GPIO ISRs.
pub static ENCODER: EncoderCell = EncoderCell::new();

/// ISR handler for both encoder channels.
/// Safe to call from interrupt context (lock-free atomics only).
#[allow(unused)]
pub fn encoder_isr_handler(a: bool, b: bool, now_ms: u32) {
    ENCODER.on_edge(a, b, now_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Clockwise Gray sequence for (B << 1) | A.
    const CW: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];
    const CCW: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];

    fn turn(cell: &EncoderCell, seq: &[(bool, bool)], start_ms: u32) -> u32 {
        let mut t = start_ms;
        for &(a, b) in seq {
            cell.on_edge(a, b, t);
            t += 10;
        }
        t
    }

    #[test]
    fn transition_table_is_antisymmetric() {
        for prev in 0..4u8 {
            for curr in 0..4u8 {
                assert_eq!(transition(prev, curr), -transition(curr, prev));
            }
        }
        assert_eq!(transition(0b00, 0b11), 0);
        assert_eq!(transition(0b01, 0b01), 0);
    }

    #[test]
    fn two_transitions_make_one_detent() {
        let cell = EncoderCell::new();
        cell.on_edge(true, false, 10);
        assert_eq!(cell.position(), 0);
        cell.on_edge(true, true, 20);
        assert_eq!(cell.position(), 1);
    }

    #[test]
    fn full_cycle_counts_both_directions() {
        let cell = EncoderCell::new();
        let t = turn(&cell, &CW, 10);
        assert_eq!(cell.position(), 2);
        turn(&cell, &CCW, t);
        assert_eq!(cell.position(), 0);
    }

    #[test]
    fn bounce_after_step_is_ignored() {
        let cell = EncoderCell::new();
        cell.on_edge(true, false, 100);
        cell.on_edge(true, true, 101);
        assert_eq!(cell.position(), 1);
        // Chatter back and forth inside the quiet window.
        cell.on_edge(true, false, 102);
        cell.on_edge(true, true, 103);
        cell.on_edge(true, false, 104);
        assert_eq!(cell.position(), 1);
    }

    #[test]
    fn rebase_drops_partial_detent() {
        let cell = EncoderCell::new();
        cell.on_edge(true, false, 10);
        cell.rebase(0, 7);
        cell.on_edge(true, true, 20);
        assert_eq!(cell.position(), 7);
        cell.on_edge(false, true, 30);
        assert_eq!(cell.position(), 8);
    }

    #[test]
    fn rebase_keeps_detent_arriving_after_read() {
        let cell = EncoderCell::new();
        let t = turn(&cell, &CW[..2], 10);
        let seen = cell.position();
        assert_eq!(seen, 1);
        // A detent lands between the read and the rebase.
        turn(&cell, &CW[2..], t);
        cell.rebase(seen, 0);
        assert_eq!(cell.position(), 1);
    }
}
