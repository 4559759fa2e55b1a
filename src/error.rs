//! Error types for TSSC encoding and decoding operations.

use thiserror::Error;

/// Error returned when encoding a record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The output buffer ran out of capacity mid-record.
    ///
    /// Recoverable: the encoder rolls its cursors back to the record
    /// boundary, so the caller can [`finish`](crate::Encoder::finish) the
    /// current buffer and re-encode the offending record into a fresh one.
    #[error("output buffer is full")]
    BufferFull,

    /// An internal coding invariant was violated (unknown mode or an
    /// unreachable branch in mode adaptation). Fatal for the session.
    #[error("coding invariant violated")]
    CodingError,
}

/// Error returned when decoding a record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input buffer ended mid-record, or an end-of-stream symbol
    /// appeared inside a record. Fatal for the stream.
    #[error("compressed stream truncated mid-record")]
    TruncatedStream,

    /// A symbol arrived out of range for its position, a 7-bit varint
    /// overran its group budget, or mode adaptation reached an unreachable
    /// branch. Indicates a corrupted or adversarial stream. Fatal.
    #[error("malformed symbol or corrupted coder state")]
    CodingError,
}
