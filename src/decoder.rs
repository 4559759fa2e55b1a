//! Decode-side session: recovers the record sequence from a compressed
//! buffer.
//!
//! The decoder is a strict mirror of the encoder. It does not know record
//! boundaries in advance: each part announces itself through the symbol
//! ranges, and an absent symbol means the corresponding prediction slot is
//! reused. Every state mutation (slot rotations, delta bookkeeping,
//! histogram updates) happens in the same order as on the encode side so
//! the adaptive coders stay bit-identical.

use crate::bitstream::BitReader;
use crate::codes::CodeWord;
use crate::error::DecodeError;
use crate::record::Record;
use crate::session::SessionState;

/// Streaming decoder over one compressed buffer.
pub struct Decoder<'a> {
    input: BitReader<'a>,
    session: SessionState,
    finished: bool,
    count: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder reading from the start of `buffer`.
    #[must_use]
    pub fn new(buffer: &'a [u8]) -> Self {
        Decoder {
            input: BitReader::new(buffer),
            session: SessionState::new(),
            finished: false,
            count: 0,
        }
    }

    /// Number of records decoded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Decodes the next record, or `Ok(None)` at end of stream.
    ///
    /// End of stream is sticky: further calls keep returning `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] when the buffer ends mid-record or
    /// an end-of-stream symbol appears inside one;
    /// [`DecodeError::CodingError`] on any symbol out of range for its
    /// position. Both are fatal for the stream.
    pub fn decode_record(&mut self) -> Result<Option<Record>, DecodeError> {
        if self.finished {
            return Ok(None);
        }
        match self.decode_parts()? {
            Some(record) => {
                self.count += 1;
                Ok(Some(record))
            }
            None => {
                self.finished = true;
                Ok(None)
            }
        }
    }

    fn decode_parts(&mut self) -> Result<Option<Record>, DecodeError> {
        let last = self.session.last_point;
        let mut code = self.session.point_mut(last).read_code(&mut self.input)?;
        if code == CodeWord::EndOfStream {
            return Ok(None);
        }

        // Point-id part: explicit XOR change, or implicit reuse of the
        // cursor's successor hint.
        let point;
        if code <= CodeWord::PointIdXor32 {
            let width = match code {
                CodeWord::PointIdXor4 => 4,
                CodeWord::PointIdXor8 => 8,
                CodeWord::PointIdXor12 => 12,
                CodeWord::PointIdXor16 => 16,
                CodeWord::PointIdXor20 => 20,
                CodeWord::PointIdXor24 => 24,
                CodeWord::PointIdXor32 => 32,
                _ => return Err(DecodeError::CodingError),
            };
            let xor = self.input.read_bits(width)?;
            let id = xor ^ self.session.prev_point_id;
            self.session.point_mut(last).prev_next_point_id = id;
            self.session.prev_point_id = id;
            point = self.session.intern(id);

            code = self.session.point_mut(point).read_code(&mut self.input)?;
            if code == CodeWord::EndOfStream {
                return Err(DecodeError::TruncatedStream);
            }
            if code < CodeWord::TimeDelta1Forward {
                return Err(DecodeError::CodingError);
            }
        } else {
            let id = self.session.point(last).prev_next_point_id;
            self.session.prev_point_id = id;
            point = self.session.intern(id);
        }
        let point_id = self.session.prev_point_id;

        // Timestamp part.
        let timestamp;
        if code <= CodeWord::TimeXor7Bit {
            let mut tcode = code;
            let mut switched = false;

            if tcode == CodeWord::Timestamp2 {
                self.session.switch_timestamp_slot();
                switched = true;
                tcode = self.session.point_mut(point).read_code(&mut self.input)?;
                if tcode == CodeWord::EndOfStream {
                    return Err(DecodeError::TruncatedStream);
                }
                if tcode < CodeWord::TimeDelta1Forward {
                    return Err(DecodeError::CodingError);
                }
            }

            if switched && tcode > CodeWord::TimeXor7Bit {
                // The new active slot already equals the timestamp; the
                // symbol just read belongs to the next part.
                timestamp = self.session.active_timestamp();
                code = tcode;
            } else {
                if tcode == CodeWord::Timestamp2 {
                    return Err(DecodeError::CodingError);
                }
                let active = self.session.active_timestamp();
                timestamp = match tcode {
                    CodeWord::TimeDelta1Forward
                    | CodeWord::TimeDelta2Forward
                    | CodeWord::TimeDelta3Forward
                    | CodeWord::TimeDelta4Forward
                    | CodeWord::TimeDelta1Reverse
                    | CodeWord::TimeDelta2Reverse
                    | CodeWord::TimeDelta3Reverse
                    | CodeWord::TimeDelta4Reverse => {
                        active.wrapping_add(self.session.delta_for(tcode))
                    }
                    CodeWord::TimeXor7Bit => {
                        let xor = read_7bit_u64(&mut self.input)?;
                        (xor ^ active as u64) as i64
                    }
                    _ => return Err(DecodeError::CodingError),
                };
                self.session.observe_time_delta(timestamp, active);
                self.session.set_active_timestamp(timestamp);

                code = self.session.point_mut(point).read_code(&mut self.input)?;
                if code == CodeWord::EndOfStream {
                    return Err(DecodeError::TruncatedStream);
                }
                if code < CodeWord::StateFlags2 {
                    return Err(DecodeError::CodingError);
                }
            }
        } else {
            timestamp = self.session.active_timestamp();
        }

        // State-flags part.
        let state_flags;
        if code <= CodeWord::StateFlags7Bit32 {
            if code == CodeWord::StateFlags2 {
                let p = self.session.point_mut(point);
                let flags = p.prev_state_flags2;
                p.prev_state_flags2 = p.prev_state_flags1;
                p.prev_state_flags1 = flags;
                state_flags = flags;
            } else {
                let xor = read_7bit_u32(&mut self.input)?;
                let p = self.session.point_mut(point);
                let flags = xor ^ p.prev_state_flags1;
                p.prev_state_flags2 = p.prev_state_flags1;
                p.prev_state_flags1 = flags;
                state_flags = flags;
            }

            code = self.session.point_mut(point).read_code(&mut self.input)?;
            if code == CodeWord::EndOfStream {
                return Err(DecodeError::TruncatedStream);
            }
            if code < CodeWord::Value1 {
                return Err(DecodeError::CodingError);
            }
        } else {
            state_flags = self.session.point(point).prev_state_flags1;
        }

        // Value part.
        let width = match code {
            CodeWord::Value1 | CodeWord::Value2 | CodeWord::Value3 | CodeWord::ValueZero => None,
            CodeWord::ValueXor4 => Some(4),
            CodeWord::ValueXor8 => Some(8),
            CodeWord::ValueXor12 => Some(12),
            CodeWord::ValueXor16 => Some(16),
            CodeWord::ValueXor20 => Some(20),
            CodeWord::ValueXor24 => Some(24),
            CodeWord::ValueXor28 => Some(28),
            CodeWord::ValueXor32 => Some(32),
            _ => return Err(DecodeError::CodingError),
        };

        let raw = if let Some(width) = width {
            let xor = self.input.read_bits(width)?;
            let p = self.session.point_mut(point);
            let value = xor ^ p.prev_value1;
            p.prev_value3 = p.prev_value2;
            p.prev_value2 = p.prev_value1;
            p.prev_value1 = value;
            value
        } else {
            let p = self.session.point_mut(point);
            match code {
                CodeWord::Value1 => p.prev_value1,
                CodeWord::Value2 => {
                    let value = p.prev_value2;
                    p.prev_value2 = p.prev_value1;
                    p.prev_value1 = value;
                    value
                }
                CodeWord::Value3 => {
                    let value = p.prev_value3;
                    p.prev_value3 = p.prev_value2;
                    p.prev_value2 = p.prev_value1;
                    p.prev_value1 = value;
                    value
                }
                _ => {
                    p.prev_value3 = p.prev_value2;
                    p.prev_value2 = p.prev_value1;
                    p.prev_value1 = 0;
                    0
                }
            }
        };

        self.session.last_point = point;
        Ok(Some(Record {
            point_id,
            timestamp,
            state_flags,
            value: f32::from_bits(raw),
        }))
    }

    #[cfg(test)]
    pub(crate) fn point_states(&self) -> &[crate::point::PointState] {
        self.session.states()
    }
}

/// Decodes a whole buffer produced by [`Encoder::finish`](crate::Encoder::finish).
///
/// # Errors
///
/// Propagates the first [`DecodeError`] encountered.
pub fn decode(buffer: &[u8]) -> Result<Vec<Record>, DecodeError> {
    let mut decoder = Decoder::new(buffer);
    let mut records = Vec::new();
    while let Some(record) = decoder.decode_record()? {
        records.push(record);
    }
    Ok(records)
}

fn read_7bit_u32(input: &mut BitReader<'_>) -> Result<u32, DecodeError> {
    let mut value = 0u32;
    for group in 0..5 {
        let byte = input.read_bits(8)?;
        value |= (byte & 0x7F) << (group * 7);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(DecodeError::CodingError)
}

fn read_7bit_u64(input: &mut BitReader<'_>) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    for group in 0..10 {
        let byte = u64::from(input.read_bits(8)?);
        value |= (byte & 0x7F) << (group * 7);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(DecodeError::CodingError)
}
