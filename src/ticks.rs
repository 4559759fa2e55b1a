//! 100-nanosecond tick timestamps as used by STTP measurements.
//!
//! A tick value counts 100-nanosecond intervals since 12:00:00 midnight,
//! January 1, 0001 UTC. Bits 0–61 carry the timestamp; bit 63 flags a leap
//! second (second 60 while the value still reads 59) and bit 62 carries the
//! leap-second direction (0 = add, 1 = delete). The codec never inspects
//! the flag bits: it delta- and XOR-encodes the full 64-bit value.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A 64-bit STTP time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticks(pub u64);

impl Ticks {
    /// UTC 0001-01-01 00:00:00.000.
    pub const MIN: Ticks = Ticks(0);
    /// UTC 9999-12-31 23:59:59.999.
    pub const MAX: Ticks = Ticks(3_155_378_975_999_999_999);

    /// Ticks per microsecond.
    pub const PER_MICROSECOND: u64 = 10;
    /// Ticks per millisecond.
    pub const PER_MILLISECOND: u64 = Self::PER_MICROSECOND * 1_000;
    /// Ticks per second.
    pub const PER_SECOND: u64 = Self::PER_MILLISECOND * 1_000;

    /// Marks the value as occurring during a leap second.
    pub const LEAP_SECOND_FLAG: u64 = 1 << 63;
    /// Leap-second direction, 0 for add, 1 for delete.
    pub const LEAP_SECOND_DIRECTION: u64 = 1 << 62;
    /// Masks off both leap-second bits.
    pub const VALUE_MASK: u64 = !Self::LEAP_SECOND_FLAG & !Self::LEAP_SECOND_DIRECTION;

    /// Ticks representation of the Unix epoch.
    pub const UNIX_BASE_OFFSET: u64 = 621_355_968_000_000_000;

    /// The timestamp portion with leap-second bits cleared, as the signed
    /// integer the codec transports.
    #[must_use]
    pub fn timestamp_value(self) -> i64 {
        (self.0 & Self::VALUE_MASK) as i64
    }

    /// Converts a Unix nanosecond timestamp into ticks.
    #[must_use]
    pub fn from_unix_ns(ns: u64) -> Ticks {
        Ticks(ns / 100 + Self::UNIX_BASE_OFFSET)
    }

    /// Converts the timestamp portion into Unix nanoseconds.
    #[must_use]
    pub fn to_unix_ns(self) -> u64 {
        ((self.0 & Self::VALUE_MASK) - Self::UNIX_BASE_OFFSET) * 100
    }

    /// The current UTC time as ticks.
    #[must_use]
    pub fn now() -> Ticks {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_unix_ns(since_epoch.as_nanos() as u64)
    }

    /// True if the leap-second flag is set.
    #[must_use]
    pub fn is_leap_second(self) -> bool {
        self.0 & Self::LEAP_SECOND_FLAG != 0
    }

    /// True if a set leap-second flag marks a deleted second.
    #[must_use]
    pub fn is_negative_leap_second(self) -> bool {
        self.is_leap_second() && self.0 & Self::LEAP_SECOND_DIRECTION != 0
    }
}

impl From<Ticks> for i64 {
    /// The full 64-bit value, flag bits included, as the codec sees it.
    fn from(t: Ticks) -> i64 {
        t.0 as i64
    }
}

impl From<i64> for Ticks {
    fn from(v: i64) -> Ticks {
        Ticks(v as u64)
    }
}
