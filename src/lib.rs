//! TSSC: adaptive compression for streaming telemetry measurements.
//!
//! A bit-packed codec for the per-point measurement records carried by the
//! Streaming Telemetry Transport Protocol (STTP): `(point id, timestamp,
//! state flags, value)` tuples. Typical synchrophasor streams repeat their
//! point rotation, timestamps, and flags almost exactly from frame to
//! frame, and TSSC exploits that temporal locality with per-point
//! prediction state.
//!
//! # How it works
//!
//! Each record is spelled as a handful of codewords from a closed 32-symbol
//! alphabet, and parts whose prediction already matches are omitted
//! entirely. Every point carries rotating slots of recent values and state
//! flags plus a successor hint for the next point id, and, at the heart of
//! the codec, an adaptive prefix coder: a histogram of recently used
//! symbols periodically re-selects one of four prefix modes so the hottest
//! symbols cost a single bit. Encoder and decoder run the same adaptation
//! schedule, so no table is ever transmitted. A warmed-up stream costs
//! around 2 bits per unchanged-shape record.
//!
//! Streams are self-delimiting (a dedicated end-of-stream symbol) and
//! self-contained: each buffer starts from fresh state, and decoding is
//! strictly sequential.
//!
//! # Example
//!
//! ```
//! use tssc::{decode, Encoder, Record, Ticks};
//!
//! let mut encoder = Encoder::with_capacity(1024);
//! let base = Ticks::from_unix_ns(1_700_000_000_000_000_000);
//!
//! for frame in 0..30 {
//!     let timestamp = i64::from(base) + frame * 33 * Ticks::PER_MILLISECOND as i64;
//!     encoder.encode_record(&Record::new(101, timestamp, 0, 59.98)).unwrap();
//!     encoder.encode_record(&Record::new(102, timestamp, 0, 0.52)).unwrap();
//! }
//!
//! let bytes = encoder.finish().unwrap();
//! let records = decode(&bytes).unwrap();
//! assert_eq!(records.len(), 60);
//! assert_eq!(records[0].point_id, 101);
//! assert_eq!(records[1].value, 0.52);
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

mod bitstream;
mod codes;
mod decoder;
mod encoder;
mod error;
mod point;
mod record;
mod session;
mod ticks;

#[cfg(test)]
mod tests;

pub use decoder::{decode, Decoder};
pub use encoder::{Encoder, DEFAULT_CAPACITY};
pub use error::{DecodeError, EncodeError};
pub use record::Record;
pub use ticks::Ticks;
