//! Day-of-week bitmap.
//!
//! ```text
//!   bit:   7    6    5    4    3    2    1    0
//!        ┌────┬────┬────┬────┬────┬────┬────┬────┐
//!        │ -- │ Sa │ Fr │ Th │ We │ Tu │ Mo │ Su │
//!        └────┴────┴────┴────┴────┴────┴────┴────┘
//! ```
//!
//! Bit 7 is reserved: every helper masks it off and none of them ever
//! set it.  Three composite masks (all days, weekdays, weekends) get
//! their own labels in every formatter before falling back to listing
//! the set days in Sunday → Saturday order.

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

/// Number of real days in the mask.
pub const DAY_COUNT: u8 = 7;

pub const ALL_DAYS: u8 = 0x7F;
pub const WEEKDAYS: u8 = 0x3E;
pub const WEEKENDS: u8 = 0x41;

const VALID_BITS: u8 = 0x7F;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const DAY_ABBREV: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const DAY_PAIRS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Longest formatter output: six full names joined by ", ".
pub type DayLabel = String<64>;

/// A 7-bit set of weekdays, Sunday = bit 0.
///
/// Stored as its raw byte; decoding goes through [`DayMask::from_bits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct DayMask(u8);

impl From<u8> for DayMask {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl From<DayMask> for u8 {
    fn from(mask: DayMask) -> Self {
        mask.0
    }
}

impl DayMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(ALL_DAYS);
    pub const WEEKDAYS: Self = Self(WEEKDAYS);
    pub const WEEKENDS: Self = Self(WEEKENDS);

    /// Build a mask from raw bits, dropping the reserved bit.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & VALID_BITS)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if `day` (0 = Sunday) is in the set.  Out-of-range days are never set.
    pub const fn is_set(self, day: u8) -> bool {
        day < DAY_COUNT && self.0 & (1 << day) != 0
    }

    /// Flip one day.  Out-of-range indices are ignored.
    pub fn toggle(&mut self, day: u8) {
        if day < DAY_COUNT {
            self.0 ^= 1 << day;
        }
    }

    /// Copying variant of [`toggle`](Self::toggle).
    #[must_use]
    pub fn toggled(mut self, day: u8) -> Self {
        self.toggle(day);
        self
    }

    /// Set or clear one day.  Out-of-range indices are ignored.
    pub fn set(&mut self, day: u8, enabled: bool) {
        if day >= DAY_COUNT {
            return;
        }
        if enabled {
            self.0 |= 1 << day;
        } else {
            self.0 &= !(1 << day);
        }
    }

    /// Whether a schedule with this mask runs on `weekday` (0 = Sunday).
    pub const fn is_active_on(self, weekday: u8) -> bool {
        self.is_set(weekday)
    }

    /// Iterate the set day indices in Sunday → Saturday order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..DAY_COUNT).filter(move |&d| self.is_set(d))
    }

    fn canonical(self) -> Option<Canonical> {
        match self.0 {
            ALL_DAYS => Some(Canonical::All),
            WEEKDAYS => Some(Canonical::Weekdays),
            WEEKENDS => Some(Canonical::Weekends),
            0 => Some(Canonical::Empty),
            _ => None,
        }
    }

    /// "All Days", "Mon-Fri", "Sat-Sun", "No Days", or "Sunday, Tuesday".
    pub fn format_long(self) -> DayLabel {
        match self.canonical() {
            Some(Canonical::All) => label("All Days"),
            Some(Canonical::Weekdays) => label("Mon-Fri"),
            Some(Canonical::Weekends) => label("Sat-Sun"),
            Some(Canonical::Empty) => label("No Days"),
            None => self.join(&DAY_NAMES, ", "),
        }
    }

    /// "All Days", "Weekdays", "Weekends", "None", or "Sun,Tue".
    pub fn format_short(self) -> DayLabel {
        match self.canonical() {
            Some(Canonical::All) => label("All Days"),
            Some(Canonical::Weekdays) => label("Weekdays"),
            Some(Canonical::Weekends) => label("Weekends"),
            Some(Canonical::Empty) => label("None"),
            None => self.join(&DAY_ABBREV, ","),
        }
    }

    /// "All Days", "Mo-Fr", "Sa,Su", "None", or "Su,Tu".
    pub fn format_compact(self) -> DayLabel {
        match self.canonical() {
            Some(Canonical::All) => label("All Days"),
            Some(Canonical::Weekdays) => label("Mo-Fr"),
            Some(Canonical::Weekends) => label("Sa,Su"),
            Some(Canonical::Empty) => label("None"),
            None => self.join(&DAY_PAIRS, ","),
        }
    }

    fn join(self, names: &[&str; 7], sep: &str) -> DayLabel {
        let mut out = DayLabel::new();
        for (n, day) in self.iter().enumerate() {
            if n > 0 {
                let _ = out.push_str(sep);
            }
            let _ = out.push_str(names[day as usize]);
        }
        out
    }
}

impl fmt::Display for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_short())
    }
}

#[derive(Clone, Copy)]
enum Canonical {
    All,
    Weekdays,
    Weekends,
    Empty,
}

fn label(s: &str) -> DayLabel {
    let mut out = DayLabel::new();
    let _ = out.push_str(s);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_bit_is_dropped() {
        assert_eq!(DayMask::from_bits(0xFF).bits(), ALL_DAYS);
    }

    #[test]
    fn decoding_drops_the_reserved_bit() {
        let mask: DayMask = postcard::from_bytes(&[0xFF]).unwrap();
        assert_eq!(mask, DayMask::ALL);
        assert_eq!(mask.format_long().as_str(), "All Days");

        let mut buf = [0u8; 1];
        assert_eq!(postcard::to_slice(&DayMask::WEEKENDS, &mut buf).unwrap(), &[WEEKENDS]);
    }

    #[test]
    fn toggle_and_set() {
        let mut m = DayMask::NONE;
        m.toggle(1);
        assert!(m.is_set(1));
        m.set(1, false);
        assert!(m.is_empty());
        m.set(6, true);
        assert_eq!(m.bits(), 0x40);
    }

    #[test]
    fn out_of_range_day_is_ignored() {
        let mut m = DayMask::NONE;
        m.toggle(7);
        m.set(9, true);
        assert!(m.is_empty());
        assert!(!DayMask::ALL.is_set(7));
    }

    #[test]
    fn canonical_labels() {
        assert_eq!(DayMask::ALL.format_long().as_str(), "All Days");
        assert_eq!(DayMask::WEEKDAYS.format_long().as_str(), "Mon-Fri");
        assert_eq!(DayMask::WEEKENDS.format_long().as_str(), "Sat-Sun");
        assert_eq!(DayMask::NONE.format_long().as_str(), "No Days");

        assert_eq!(DayMask::WEEKDAYS.format_short().as_str(), "Weekdays");
        assert_eq!(DayMask::WEEKENDS.format_short().as_str(), "Weekends");
        assert_eq!(DayMask::NONE.format_short().as_str(), "None");

        assert_eq!(DayMask::WEEKDAYS.format_compact().as_str(), "Mo-Fr");
        assert_eq!(DayMask::WEEKENDS.format_compact().as_str(), "Sa,Su");
        assert_eq!(DayMask::NONE.format_compact().as_str(), "None");
    }

    #[test]
    fn enumerated_labels_follow_week_order() {
        let m = DayMask::from_bits(0b0100_0101); // Sun, Tue, Sat
        assert_eq!(m.format_long().as_str(), "Sunday, Tuesday, Saturday");
        assert_eq!(m.format_short().as_str(), "Sun,Tue,Sat");
        assert_eq!(m.format_compact().as_str(), "Su,Tu,Sa");
    }

    #[test]
    fn longest_label_fits() {
        // Every day but one: the longest non-canonical long label.
        let m = DayMask::from_bits(ALL_DAYS & !1);
        assert_eq!(
            m.format_long().as_str(),
            "Monday, Tuesday, Wednesday, Thursday, Friday, Saturday"
        );
    }
}
