//! Outlet activation engine.
//!
//! State-based: each evaluation recomputes every relay's desired state
//! from the enabled outlet schedules and drives only the relays whose
//! state changed.  Relays start OFF; without a wall clock every relay is
//! held OFF.

use log::info;

use crate::app::ports::{ActuatorPort, WallClock};
use crate::schedule::{OutletSchedule, RELAY_COUNT};

const RELAYS: usize = RELAY_COUNT as usize;

/// Whether `schedule` wants its relay on at `now`.
///
/// Window mode covers `[on, off)` and wraps past midnight when
/// `off < on`; an empty window (`on == off`) never activates.  Interval
/// mode is active for the first minute of every period.
pub fn is_active(schedule: &OutletSchedule, now: &WallClock) -> bool {
    if !schedule.enabled || !schedule.days.is_active_on(now.weekday) {
        return false;
    }
    let minute = now.minute_of_day();
    if schedule.is_interval {
        return schedule.interval_minutes > 0 && minute % schedule.interval_minutes == 0;
    }
    let on = schedule.on_minute_of_day();
    let off = schedule.off_minute_of_day();
    if on < off {
        (on..off).contains(&minute)
    } else if off < on {
        minute >= on || minute < off
    } else {
        false
    }
}

/// A relay whose state was just changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayChange {
    pub relay: u8,
    pub on: bool,
}

pub struct OutletEngine {
    relays: [bool; RELAYS],
    last_eval_ms: Option<u32>,
    interval_ms: u32,
}

impl OutletEngine {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            relays: [false; RELAYS],
            last_eval_ms: None,
            interval_ms,
        }
    }

    /// Current state of `relay` (1-based); unknown ids read as off.
    pub fn relay_state(&self, relay: u8) -> bool {
        usize::from(relay)
            .checked_sub(1)
            .and_then(|i| self.relays.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Desired relay states at `now`.
    pub fn desired(schedules: &[OutletSchedule], now: Option<&WallClock>) -> [bool; RELAYS] {
        let mut want = [false; RELAYS];
        let Some(now) = now else {
            return want;
        };
        for s in schedules {
            let Some(slot) = usize::from(s.relay).checked_sub(1) else {
                continue;
            };
            if let Some(w) = want.get_mut(slot) {
                *w |= is_active(s, now);
            }
        }
        want
    }

    /// Re-evaluate at most once per interval and apply changes.
    pub fn evaluate(
        &mut self,
        now_ms: u32,
        wall: Option<&WallClock>,
        schedules: &[OutletSchedule],
        hw: &mut impl ActuatorPort,
    ) -> heapless::Vec<RelayChange, RELAYS> {
        let mut changes = heapless::Vec::new();
        if let Some(last) = self.last_eval_ms {
            if now_ms.wrapping_sub(last) < self.interval_ms {
                return changes;
            }
        }
        self.last_eval_ms = Some(now_ms);

        let want = Self::desired(schedules, wall);
        for (i, (&on, state)) in want.iter().zip(self.relays.iter_mut()).enumerate() {
            if on == *state {
                continue;
            }
            let relay = i as u8 + 1;
            info!("Relay {} {}", relay, if on { "ON" } else { "OFF" });
            hw.set_relay(relay, on);
            *state = on;
            let _ = changes.push(RelayChange { relay, on });
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::DayMask;

    #[derive(Default)]
    struct Relays {
        calls: Vec<(u8, bool)>,
    }

    impl ActuatorPort for Relays {
        fn set_pump(&mut self, _pump: u8, _duty: u8) {}
        fn set_relay(&mut self, relay: u8, on: bool) {
            self.calls.push((relay, on));
        }
    }

    fn at(weekday: u8, hour: u8, minute: u8) -> WallClock {
        WallClock {
            year: 2026,
            month: 10,
            day: 11 + weekday,
            weekday,
            hour,
            minute,
            second: 0,
        }
    }

    fn window(relay: u8, on: (u8, u8), off: (u8, u8)) -> OutletSchedule {
        OutletSchedule {
            relay,
            days: DayMask::ALL,
            hour_on: on.0,
            minute_on: on.1,
            hour_off: off.0,
            minute_off: off.1,
            enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn window_is_half_open() {
        let s = window(1, (6, 0), (22, 0));
        assert!(!is_active(&s, &at(1, 5, 59)));
        assert!(is_active(&s, &at(1, 6, 0)));
        assert!(is_active(&s, &at(1, 21, 59)));
        assert!(!is_active(&s, &at(1, 22, 0)));
    }

    #[test]
    fn window_wraps_midnight() {
        let s = window(2, (22, 0), (6, 0));
        assert!(is_active(&s, &at(3, 23, 30)));
        assert!(is_active(&s, &at(3, 0, 0)));
        assert!(is_active(&s, &at(3, 5, 59)));
        assert!(!is_active(&s, &at(3, 6, 0)));
        assert!(!is_active(&s, &at(3, 12, 0)));
    }

    #[test]
    fn empty_window_never_activates() {
        let s = window(1, (8, 0), (8, 0));
        assert!(!is_active(&s, &at(1, 8, 0)));
    }

    #[test]
    fn interval_fires_on_period_boundaries() {
        let s = OutletSchedule {
            is_interval: true,
            interval_minutes: 90,
            ..window(1, (0, 0), (0, 0))
        };
        assert!(is_active(&s, &at(1, 0, 0)));
        assert!(is_active(&s, &at(1, 1, 30)));
        assert!(!is_active(&s, &at(1, 1, 31)));
        assert!(is_active(&s, &at(1, 3, 0)));
    }

    #[test]
    fn day_mask_and_enable_gate_activation() {
        let mut s = window(1, (6, 0), (22, 0));
        s.days = DayMask::WEEKENDS;
        assert!(!is_active(&s, &at(2, 12, 0)));
        assert!(is_active(&s, &at(6, 12, 0)));
        s.enabled = false;
        assert!(!is_active(&s, &at(6, 12, 0)));
    }

    #[test]
    fn evaluate_applies_only_changes() {
        let mut engine = OutletEngine::new(1_000);
        let mut hw = Relays::default();
        let list = [window(3, (6, 0), (22, 0))];

        let changes = engine.evaluate(0, Some(&at(1, 12, 0)), &list, &mut hw);
        assert_eq!(changes.as_slice(), [RelayChange { relay: 3, on: true }]);
        assert!(engine.relay_state(3));

        assert!(engine.evaluate(1_000, Some(&at(1, 12, 1)), &list, &mut hw).is_empty());
        assert_eq!(hw.calls, [(3, true)]);

        engine.evaluate(2_000, Some(&at(1, 22, 0)), &list, &mut hw);
        assert_eq!(hw.calls, [(3, true), (3, false)]);
    }

    #[test]
    fn lost_clock_turns_relays_off() {
        let mut engine = OutletEngine::new(1_000);
        let mut hw = Relays::default();
        let list = [window(1, (6, 0), (22, 0))];
        engine.evaluate(0, Some(&at(1, 12, 0)), &list, &mut hw);
        engine.evaluate(1_000, None, &list, &mut hw);
        assert!(!engine.relay_state(1));
    }

    #[test]
    fn evaluation_is_rate_limited() {
        let mut engine = OutletEngine::new(1_000);
        let mut hw = Relays::default();
        let list = [window(1, (6, 0), (22, 0))];
        engine.evaluate(0, Some(&at(1, 5, 0)), &list, &mut hw);
        assert!(engine.evaluate(999, Some(&at(1, 12, 0)), &list, &mut hw).is_empty());
        assert_eq!(engine.evaluate(1_000, Some(&at(1, 12, 0)), &list, &mut hw).len(), 1);
    }

    #[test]
    fn overlapping_schedules_or_together() {
        let list = [window(1, (6, 0), (8, 0)), window(1, (7, 0), (10, 0))];
        let want = OutletEngine::desired(&list, Some(&at(1, 9, 0)));
        assert_eq!(want, [true, false, false, false]);
    }
}
