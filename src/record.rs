//! The measurement record compressed by the codec.

use serde::{Deserialize, Serialize};

/// One telemetry measurement.
///
/// The codec treats `timestamp` as an opaque integer (typically a
/// [`Ticks`](crate::Ticks) value) and `value` by its raw bit pattern, so
/// leap-second flag bits and non-finite floats round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Measurement point identifier.
    pub point_id: u32,
    /// 100-nanosecond ticks since the STTP epoch.
    pub timestamp: i64,
    /// Quality/state flag bitfield.
    pub state_flags: u32,
    /// Measured value.
    pub value: f32,
}

impl Record {
    #[must_use]
    pub fn new(point_id: u32, timestamp: i64, state_flags: u32, value: f32) -> Self {
        Record {
            point_id,
            timestamp,
            state_flags,
            value,
        }
    }
}
