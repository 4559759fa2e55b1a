//! The TSSC symbol alphabet.
//!
//! Every record is spelled as a short sequence of these 32 codewords, each
//! followed by zero or more raw payload bits. Only the codeword itself is
//! routed through the adaptive coder; payloads are fixed-width or
//! 7-bit-group fields. The numeric assignment is part of the wire format
//! and must never change.

/// One of the 32 TSSC codewords.
///
/// The discriminants are wire values. Ranges are meaningful: 1–7 are
/// point-id changes, 8–17 timestamp changes, 18–19 state-flags changes,
/// 20–31 value symbols. The decoder relies on this ordering to detect
/// which optional record parts are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub(crate) enum CodeWord {
    EndOfStream = 0,
    PointIdXor4 = 1,
    PointIdXor8 = 2,
    PointIdXor12 = 3,
    PointIdXor16 = 4,
    PointIdXor20 = 5,
    PointIdXor24 = 6,
    PointIdXor32 = 7,
    TimeDelta1Forward = 8,
    TimeDelta2Forward = 9,
    TimeDelta3Forward = 10,
    TimeDelta4Forward = 11,
    TimeDelta1Reverse = 12,
    TimeDelta2Reverse = 13,
    TimeDelta3Reverse = 14,
    TimeDelta4Reverse = 15,
    Timestamp2 = 16,
    TimeXor7Bit = 17,
    StateFlags2 = 18,
    StateFlags7Bit32 = 19,
    Value1 = 20,
    Value2 = 21,
    Value3 = 22,
    ValueZero = 23,
    ValueXor4 = 24,
    ValueXor8 = 25,
    ValueXor12 = 26,
    ValueXor16 = 27,
    ValueXor20 = 28,
    ValueXor24 = 29,
    ValueXor28 = 30,
    ValueXor32 = 31,
}

impl CodeWord {
    const ALL: [CodeWord; 32] = [
        CodeWord::EndOfStream,
        CodeWord::PointIdXor4,
        CodeWord::PointIdXor8,
        CodeWord::PointIdXor12,
        CodeWord::PointIdXor16,
        CodeWord::PointIdXor20,
        CodeWord::PointIdXor24,
        CodeWord::PointIdXor32,
        CodeWord::TimeDelta1Forward,
        CodeWord::TimeDelta2Forward,
        CodeWord::TimeDelta3Forward,
        CodeWord::TimeDelta4Forward,
        CodeWord::TimeDelta1Reverse,
        CodeWord::TimeDelta2Reverse,
        CodeWord::TimeDelta3Reverse,
        CodeWord::TimeDelta4Reverse,
        CodeWord::Timestamp2,
        CodeWord::TimeXor7Bit,
        CodeWord::StateFlags2,
        CodeWord::StateFlags7Bit32,
        CodeWord::Value1,
        CodeWord::Value2,
        CodeWord::Value3,
        CodeWord::ValueZero,
        CodeWord::ValueXor4,
        CodeWord::ValueXor8,
        CodeWord::ValueXor12,
        CodeWord::ValueXor16,
        CodeWord::ValueXor20,
        CodeWord::ValueXor24,
        CodeWord::ValueXor28,
        CodeWord::ValueXor32,
    ];

    /// Maps a raw 5-bit symbol index back to its codeword.
    #[inline]
    pub(crate) fn from_bits(bits: u32) -> CodeWord {
        debug_assert!(bits < 32);
        Self::ALL[(bits & 31) as usize]
    }

    #[inline]
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Smallest point-id codeword whose width holds `xor`, with that width.
#[inline]
pub(crate) fn point_id_code(xor: u32) -> (CodeWord, u32) {
    match xor {
        x if x < 1 << 4 => (CodeWord::PointIdXor4, 4),
        x if x < 1 << 8 => (CodeWord::PointIdXor8, 8),
        x if x < 1 << 12 => (CodeWord::PointIdXor12, 12),
        x if x < 1 << 16 => (CodeWord::PointIdXor16, 16),
        x if x < 1 << 20 => (CodeWord::PointIdXor20, 20),
        x if x < 1 << 24 => (CodeWord::PointIdXor24, 24),
        _ => (CodeWord::PointIdXor32, 32),
    }
}

/// Smallest value codeword whose width holds `xor`, with that width.
#[inline]
pub(crate) fn value_code(xor: u32) -> (CodeWord, u32) {
    match xor {
        x if x < 1 << 4 => (CodeWord::ValueXor4, 4),
        x if x < 1 << 8 => (CodeWord::ValueXor8, 8),
        x if x < 1 << 12 => (CodeWord::ValueXor12, 12),
        x if x < 1 << 16 => (CodeWord::ValueXor16, 16),
        x if x < 1 << 20 => (CodeWord::ValueXor20, 20),
        x if x < 1 << 24 => (CodeWord::ValueXor24, 24),
        x if x < 1 << 28 => (CodeWord::ValueXor28, 28),
        _ => (CodeWord::ValueXor32, 32),
    }
}
