//! Encode-side session: turns measurement records into a compressed
//! symbol stream.
//!
//! The per-record protocol spells up to four parts (point id, timestamp,
//! state flags, value), and each part is omitted entirely when the
//! prediction state already matches. Every symbol is routed through the
//! adaptive coder of one `PointState`: the record's first symbol through
//! the cursor's (the previously coded point), the rest through the
//! record's own point once it is identified.

use crate::bitstream::BitWriter;
use crate::codes::{point_id_code, value_code, CodeWord};
use crate::error::EncodeError;
use crate::record::Record;
use crate::session::SessionState;

/// Default output capacity, sized to a typical STTP data packet.
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// Bytes held back so `finish` can always spell the end-of-stream symbol
/// and flush, even right after a record hit `BufferFull`.
const END_OF_STREAM_RESERVE: usize = 2;

/// Streaming encoder for one compressed buffer.
///
/// An encoder is single-use: records go in through
/// [`encode_record`](Encoder::encode_record), and [`finish`](Encoder::finish)
/// terminates and returns the buffer. On [`EncodeError::BufferFull`] the
/// encoder rolls all cursor state back to the record boundary, so the
/// caller can finish this buffer and re-encode the offending record into a
/// fresh encoder.
pub struct Encoder {
    out: BitWriter,
    session: SessionState,
    capacity: usize,
    count: usize,
}

impl Encoder {
    /// Creates an encoder with the default output capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an encoder bounded to `capacity` output bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Encoder {
            out: BitWriter::with_limit(capacity.saturating_sub(END_OF_STREAM_RESERVE)),
            session: SessionState::new(),
            capacity,
            count: 0,
        }
    }

    /// The configured output capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records encoded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Compressed size so far, including the partially filled byte.
    #[must_use]
    pub fn size(&self) -> usize {
        self.out.size()
    }

    /// Appends one record to the stream.
    ///
    /// # Errors
    ///
    /// [`EncodeError::BufferFull`] when the record does not fit; the
    /// encoder state is rolled back to the record boundary and stays
    /// usable. [`EncodeError::CodingError`] indicates a corrupted session
    /// and is fatal.
    pub fn encode_record(&mut self, record: &Record) -> Result<(), EncodeError> {
        let point = self.session.intern(record.point_id);
        let out_mark = self.out.mark();
        let session_mark = self.session.mark(point);

        match self.encode_parts(record, point) {
            Ok(()) => {
                self.count += 1;
                Ok(())
            }
            Err(err) => {
                self.out.rewind(out_mark);
                self.session.restore(session_mark);
                Err(err)
            }
        }
    }

    /// Terminates the stream and returns the compressed buffer.
    ///
    /// # Errors
    ///
    /// [`EncodeError::BufferFull`] only when the configured capacity is
    /// smaller than the end-of-stream reservation itself.
    pub fn finish(mut self) -> Result<Vec<u8>, EncodeError> {
        self.out.set_limit(self.capacity);
        let last = self.session.last_point;
        self.session
            .point_mut(last)
            .write_code(CodeWord::EndOfStream, &mut self.out)?;
        self.out.flush()?;
        Ok(self.out.into_bytes())
    }

    fn encode_parts(&mut self, record: &Record, point: usize) -> Result<(), EncodeError> {
        let id = record.point_id;
        let last = self.session.last_point;
        let mut coder = last;

        if self.session.point(last).prev_next_point_id != id {
            let xor = id ^ self.session.prev_point_id;
            let (code, width) = point_id_code(xor);
            self.session
                .point_mut(coder)
                .write_code(code, &mut self.out)?;
            self.out.write_bits(xor, width)?;
            self.session.point_mut(last).prev_next_point_id = id;
            coder = point;
        }
        self.session.prev_point_id = id;

        if record.timestamp != self.session.active_timestamp() {
            self.encode_timestamp(record.timestamp, &mut coder, point)?;
        }

        let flags = record.state_flags;
        if flags != self.session.point(point).prev_state_flags1 {
            if flags == self.session.point(point).prev_state_flags2 {
                self.session
                    .point_mut(coder)
                    .write_code(CodeWord::StateFlags2, &mut self.out)?;
            } else {
                let xor = flags ^ self.session.point(point).prev_state_flags1;
                self.session
                    .point_mut(coder)
                    .write_code(CodeWord::StateFlags7Bit32, &mut self.out)?;
                write_7bit_u32(&mut self.out, xor)?;
            }
            let p = self.session.point_mut(point);
            p.prev_state_flags2 = p.prev_state_flags1;
            p.prev_state_flags1 = flags;
            coder = point;
        }

        self.encode_value(record.value.to_bits(), coder, point)?;

        self.session.last_point = point;
        Ok(())
    }

    /// Timestamp part. Tries the four stored deltas against the active
    /// slot, then a slot switch when the inactive slot's XOR is strictly
    /// shorter, and falls back to a 7-bit-group XOR. Always ends by
    /// recording the observed delta and overwriting the active slot.
    fn encode_timestamp(
        &mut self,
        timestamp: i64,
        coder: &mut usize,
        point: usize,
    ) -> Result<(), EncodeError> {
        let active = self.session.active_timestamp();
        let d = timestamp.wrapping_sub(active);

        if let Some(code) = self.session.time_delta_code(d) {
            self.session
                .point_mut(*coder)
                .write_code(code, &mut self.out)?;
            *coder = point;
        } else {
            let xor_active = (timestamp ^ active) as u64;
            let xor_other = (timestamp ^ self.session.inactive_timestamp()) as u64;

            if seven_bit_len(xor_other) < seven_bit_len(xor_active) {
                self.session
                    .point_mut(*coder)
                    .write_code(CodeWord::Timestamp2, &mut self.out)?;
                *coder = point;
                self.session.switch_timestamp_slot();

                let active = self.session.active_timestamp();
                let d = timestamp.wrapping_sub(active);
                if d != 0 {
                    if let Some(code) = self.session.time_delta_code(d) {
                        self.session
                            .point_mut(*coder)
                            .write_code(code, &mut self.out)?;
                    } else {
                        self.session
                            .point_mut(*coder)
                            .write_code(CodeWord::TimeXor7Bit, &mut self.out)?;
                        write_7bit_u64(&mut self.out, (timestamp ^ active) as u64)?;
                    }
                }
            } else {
                self.session
                    .point_mut(*coder)
                    .write_code(CodeWord::TimeXor7Bit, &mut self.out)?;
                write_7bit_u64(&mut self.out, xor_active)?;
                *coder = point;
            }
        }

        let base = self.session.active_timestamp();
        self.session.observe_time_delta(timestamp, base);
        self.session.set_active_timestamp(timestamp);
        Ok(())
    }

    /// Value part: the three MRU slots, the zero shortcut, then the
    /// smallest XOR width against slot 1. Slot hits promote to slot 1.
    fn encode_value(&mut self, raw: u32, coder: usize, point: usize) -> Result<(), EncodeError> {
        let (v1, v2, v3) = {
            let p = self.session.point(point);
            (p.prev_value1, p.prev_value2, p.prev_value3)
        };

        if raw == v1 {
            self.session
                .point_mut(coder)
                .write_code(CodeWord::Value1, &mut self.out)?;
        } else if raw == v2 {
            self.session
                .point_mut(coder)
                .write_code(CodeWord::Value2, &mut self.out)?;
            let p = self.session.point_mut(point);
            p.prev_value2 = v1;
            p.prev_value1 = raw;
        } else if raw == v3 {
            self.session
                .point_mut(coder)
                .write_code(CodeWord::Value3, &mut self.out)?;
            let p = self.session.point_mut(point);
            p.prev_value3 = v2;
            p.prev_value2 = v1;
            p.prev_value1 = raw;
        } else if raw == 0 {
            self.session
                .point_mut(coder)
                .write_code(CodeWord::ValueZero, &mut self.out)?;
            let p = self.session.point_mut(point);
            p.prev_value3 = v2;
            p.prev_value2 = v1;
            p.prev_value1 = 0;
        } else {
            let xor = raw ^ v1;
            let (code, width) = value_code(xor);
            self.session
                .point_mut(coder)
                .write_code(code, &mut self.out)?;
            self.out.write_bits(xor, width)?;
            let p = self.session.point_mut(point);
            p.prev_value3 = v2;
            p.prev_value2 = v1;
            p.prev_value1 = raw;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn point_states(&self) -> &[crate::point::PointState] {
        self.session.states()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of 7-bit groups needed for `value`; at least one.
fn seven_bit_len(value: u64) -> u32 {
    let bits = 64 - value.leading_zeros();
    bits.div_ceil(7).max(1)
}

fn write_7bit_u32(out: &mut BitWriter, mut value: u32) -> Result<(), EncodeError> {
    loop {
        if value < 0x80 {
            return out.write_bits(value, 8);
        }
        out.write_bits((value & 0x7F) | 0x80, 8)?;
        value >>= 7;
    }
}

fn write_7bit_u64(out: &mut BitWriter, mut value: u64) -> Result<(), EncodeError> {
    loop {
        if value < 0x80 {
            return out.write_bits(value as u32, 8);
        }
        out.write_bits(((value & 0x7F) | 0x80) as u32, 8)?;
        value >>= 7;
    }
}
