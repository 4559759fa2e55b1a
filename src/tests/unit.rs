use crate::bitstream::{BitReader, BitWriter};
use crate::codes::CodeWord;
use crate::point::PointState;
use crate::{decode, DecodeError, Decoder, EncodeError, Encoder, Record, Ticks};

/// 30 fps phasor frame spacing in ticks.
const FRAME_TICKS: i64 = 333_333;
const BASE_TICKS: i64 = 638_000_000_000_000_000;

fn encode_all(records: &[Record], capacity: usize) -> Vec<u8> {
    let mut encoder = Encoder::with_capacity(capacity);
    for record in records {
        encoder.encode_record(record).unwrap();
    }
    encoder.finish().unwrap()
}

// ---------------------------------------------------------------- bitstream

#[test]
fn bitstream_roundtrip_mixed_widths() {
    let ops: &[(u32, u32)] = &[
        (0b1, 1),
        (0b101, 3),
        (0xDEAD_BEEF, 32),
        (0x1234, 16),
        (0, 5),
        (0x7F, 7),
    ];
    let total_bits: u32 = ops.iter().map(|&(_, n)| n).sum();
    assert_eq!(total_bits, 64);

    let mut writer = BitWriter::with_limit(64);
    for &(value, width) in ops {
        writer.write_bits(value, width).unwrap();
    }
    writer.flush().unwrap();
    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), 8);

    let mut reader = BitReader::new(&bytes);
    for &(value, width) in ops {
        let mask = if width == 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };
        assert_eq!(reader.read_bits(width).unwrap(), value & mask);
    }
}

#[test]
fn bitstream_full_width_write_keeps_high_byte() {
    let mut writer = BitWriter::with_limit(8);
    writer.write_bits(0xDEAD_BEEF, 32).unwrap();
    writer.flush().unwrap();
    assert_eq!(writer.into_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF]);

    // Unaligned by 3 bits first: the 32-bit value must survive intact.
    let mut writer = BitWriter::with_limit(8);
    writer.write_bits(0b101, 3).unwrap();
    writer.write_bits(0xDEAD_BEEF, 32).unwrap();
    writer.flush().unwrap();
    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(reader.read_bits(32).unwrap(), 0xDEAD_BEEF);
}

#[test]
fn bitstream_flush_pads_with_zeros() {
    let mut writer = BitWriter::with_limit(4);
    writer.write_bits(0b101, 3).unwrap();
    writer.flush().unwrap();
    let bytes = writer.into_bytes();
    assert_eq!(bytes, vec![0b1010_0000]);

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(reader.read_bits(5).unwrap(), 0);
    assert_eq!(reader.read_bit(), Err(DecodeError::TruncatedStream));
}

#[test]
fn bitstream_write_past_limit_is_buffer_full() {
    let mut writer = BitWriter::with_limit(1);
    writer.write_bits(0xFF, 8).unwrap();
    // Pending bits are fine until they would spill a byte.
    writer.write_bits(1, 1).unwrap();
    assert_eq!(writer.write_bits(0xFF, 8), Err(EncodeError::BufferFull));
    assert_eq!(writer.flush(), Err(EncodeError::BufferFull));
}

#[test]
fn bitstream_rewind_discards_partial_write() {
    let mut writer = BitWriter::with_limit(16);
    writer.write_bits(0xAB, 8).unwrap();
    let mark = writer.mark();
    writer.write_bits(0xCDEF, 16).unwrap();
    writer.rewind(mark);
    writer.flush().unwrap();
    assert_eq!(writer.into_bytes(), vec![0xAB]);
}

// --------------------------------------------------------------- point state

#[test]
fn point_state_starts_in_mode4_with_value_slots_hot() {
    let state = PointState::new(0);
    assert_eq!(state.mode(), 4);
    let hot = state.hot_slots();
    assert_eq!(&hot[3..], &[20, 21, 22]);
    assert_eq!(state.startup_mode(), 0);
}

#[test]
fn first_adaptation_fires_after_six_symbols() {
    let mut state = PointState::new(0);
    let mut writer = BitWriter::with_limit(64);
    for _ in 0..5 {
        state.write_code(CodeWord::Value1, &mut writer).unwrap();
        assert_eq!(state.startup_mode(), 0);
        assert_eq!(state.mode(), 4);
    }
    state.write_code(CodeWord::Value1, &mut writer).unwrap();
    assert_eq!(state.startup_mode(), 1);
    // One symbol dominating the histogram: modes 2, 3 and 4 tie on size and
    // the lower mode number wins.
    assert_eq!(state.mode(), 2);
    assert_eq!(state.hot_slots()[0], CodeWord::Value1.as_u8());
}

#[test]
fn top_three_selection_breaks_ties_by_symbol_index() {
    let mut state = PointState::new(0);
    let mut writer = BitWriter::with_limit(64);
    for &bits in &[3u32, 5, 9, 3, 5, 9] {
        state
            .write_code(CodeWord::from_bits(bits), &mut writer)
            .unwrap();
    }
    // Three symbols with two hits each: ranks follow ascending index.
    assert_eq!(state.mode(), 4);
    assert_eq!(&state.hot_slots()[3..], &[3, 5, 9]);
}

#[test]
fn startup_schedule_is_monotonic_and_saturates() {
    let mut state = PointState::new(0);
    let mut writer = BitWriter::with_limit(512);
    let mut previous = 0;
    for _ in 0..400 {
        state.write_code(CodeWord::Value1, &mut writer).unwrap();
        let startup = state.startup_mode();
        assert!(startup >= previous);
        assert!(startup <= 3);
        previous = startup;
    }
    assert_eq!(previous, 3);
}

#[test]
fn point_state_write_read_stay_in_lockstep() {
    let sequence: Vec<CodeWord> = [
        20u32, 20, 8, 20, 19, 20, 31, 8, 20, 21, 8, 20, 20, 18, 22, 8, 20, 20, 20, 8, 23, 20, 17,
        20, 8, 20, 21, 20,
    ]
    .iter()
    .map(|&bits| CodeWord::from_bits(bits))
    .collect();

    let mut writer_state = PointState::new(7);
    let mut writer = BitWriter::with_limit(128);
    for &code in &sequence {
        writer_state.write_code(code, &mut writer).unwrap();
    }
    writer.flush().unwrap();
    let bytes = writer.into_bytes();

    let mut reader_state = PointState::new(7);
    let mut reader = BitReader::new(&bytes);
    for &code in &sequence {
        assert_eq!(reader_state.read_code(&mut reader).unwrap(), code);
    }
    assert_eq!(reader_state, writer_state);
}

// ------------------------------------------------------------------ scenarios

#[test]
fn single_record_roundtrip() {
    let record = Record::new(42, BASE_TICKS, 0x0001, 119.98);
    let bytes = encode_all(&[record], 256);
    assert_eq!(decode(&bytes).unwrap(), vec![record]);
}

#[test]
fn empty_stream_decodes_to_nothing() {
    let bytes = Encoder::with_capacity(16).finish().unwrap();
    assert_eq!(bytes.len(), 1);
    assert!(decode(&bytes).unwrap().is_empty());
}

/// Constant point and delta settle to prefix-only records.
#[test]
fn constant_point_constant_delta_compresses_to_minimum() {
    let records: Vec<Record> = (0..200)
        .map(|i| Record::new(17, BASE_TICKS + i * FRAME_TICKS, 0xAAAA, 3.14))
        .collect();

    let mut encoder = Encoder::with_capacity(4096);
    for record in &records[..100] {
        encoder.encode_record(record).unwrap();
    }
    let warm_size = encoder.size();
    for record in &records[100..] {
        encoder.encode_record(record).unwrap();
    }
    // Warmed up, a record is an implicit id, a hot time-delta prefix and a
    // hot value-slot prefix: at most 4 bits.
    assert!(
        encoder.size() - warm_size <= 60,
        "steady-state cost too high: {} bytes for 100 records",
        encoder.size() - warm_size
    );

    let bytes = encoder.finish().unwrap();
    assert!(bytes.len() < 150, "total {} bytes", bytes.len());
    assert_eq!(decode(&bytes).unwrap(), records);
}

/// Two interleaved points adapt independently and predict each other.
#[test]
fn interleaved_points_roundtrip_and_share_nothing() {
    let mut records = Vec::new();
    for frame in 0..80 {
        let timestamp = BASE_TICKS + frame * FRAME_TICKS;
        let a = if frame % 2 == 0 { 59.98 } else { 60.02 };
        let b = 0.517 + frame as f32 * 0.001;
        records.push(Record::new(10, timestamp, 0, a));
        records.push(Record::new(11, timestamp, 0, b));
    }

    let mut encoder = Encoder::with_capacity(8192);
    for record in &records {
        encoder.encode_record(record).unwrap();
    }
    // Synthetic cursor state plus one state per point id.
    assert_eq!(encoder.point_states().len(), 3);

    let bytes = encoder.finish().unwrap();
    assert_eq!(decode(&bytes).unwrap(), records);
}

/// Value slots are MRU-ordered, rotating on every non-slot-1 hit.
#[test]
fn value_slots_rotate_most_recently_used_first() {
    let (a, b, c) = (1.25f32, 2.5f32, 5.0f32);
    let mut encoder = Encoder::with_capacity(1024);
    for &value in &[a, b, c, a] {
        encoder
            .encode_record(&Record::new(3, BASE_TICKS, 0, value))
            .unwrap();
    }

    // Arena slot 0 is the synthetic cursor; slot 1 is point 3.
    let state = &encoder.point_states()[1];
    assert_eq!(state.prev_value1, a.to_bits());
    assert_eq!(state.prev_value2, c.to_bits());
    assert_eq!(state.prev_value3, b.to_bits());

    let mut records = Vec::new();
    for i in 0..60 {
        let value = [a, b, c][i % 3];
        records.push(Record::new(3, BASE_TICKS + i as i64, 0, value));
    }
    let bytes = encode_all(&records, 4096);
    assert_eq!(decode(&bytes).unwrap(), records);
}

/// Timestamps bouncing between two values decode exactly.
#[test]
fn backward_time_jumps_roundtrip() {
    let records: Vec<Record> = (0..60)
        .map(|i| {
            let timestamp = BASE_TICKS + (i % 2) * FRAME_TICKS;
            Record::new(9, timestamp, 0, 1.0)
        })
        .collect();
    let bytes = encode_all(&records, 4096);
    assert_eq!(decode(&bytes).unwrap(), records);
}

/// A full buffer rolls back cleanly and the stream stays valid.
#[test]
fn buffer_full_recovery_preserves_the_record_stream() {
    let records: Vec<Record> = (0..50)
        .map(|i| {
            Record::new(
                100 + (i % 3) as u32,
                BASE_TICKS + i * FRAME_TICKS,
                i as u32,
                i as f32 * 1.618,
            )
        })
        .collect();

    let mut encoder = Encoder::with_capacity(64);
    let mut accepted = 0;
    while accepted < records.len() {
        match encoder.encode_record(&records[accepted]) {
            Ok(()) => accepted += 1,
            Err(EncodeError::BufferFull) => break,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
    assert!(accepted > 0, "nothing fit in 64 bytes");
    assert!(accepted < records.len(), "64 bytes held everything");
    assert_eq!(encoder.count(), accepted);

    // Retrying the same record fails the same way and changes nothing.
    let size_before = encoder.size();
    assert_eq!(
        encoder.encode_record(&records[accepted]),
        Err(EncodeError::BufferFull)
    );
    assert_eq!(encoder.size(), size_before);

    let first = encoder.finish().unwrap();
    assert!(first.len() <= 64);
    assert_eq!(decode(&first).unwrap(), records[..accepted]);

    let second = encode_all(&records[accepted..], 1 << 16);
    let mut all = decode(&first).unwrap();
    all.extend(decode(&second).unwrap());
    assert_eq!(all, records);
}

/// End of stream is sticky.
#[test]
fn end_of_stream_is_idempotent() {
    let records: Vec<Record> = (0..3)
        .map(|i| Record::new(5, BASE_TICKS + i * FRAME_TICKS, 0, 2.0))
        .collect();
    let bytes = encode_all(&records, 1024);

    let mut decoder = Decoder::new(&bytes);
    for record in &records {
        assert_eq!(decoder.decode_record().unwrap(), Some(*record));
    }
    assert_eq!(decoder.decode_record().unwrap(), None);
    assert_eq!(decoder.decode_record().unwrap(), None);
    assert_eq!(decoder.decode_record().unwrap(), None);
    assert_eq!(decoder.count(), records.len());
}

// -------------------------------------------------------- symmetry and state

#[test]
fn encoder_and_decoder_states_match_after_identical_symbols() {
    let mut records = Vec::new();
    for i in 0i64..400 {
        let point_id = [7u32, 8, 9][(i % 3) as usize];
        let timestamp = BASE_TICKS + (i / 3) * FRAME_TICKS;
        let flags = if i % 50 == 0 { 0x4000 } else { 0 };
        let value = if i % 11 == 0 {
            i as f32 * 0.37
        } else {
            59.98 + (i % 5) as f32 * 0.01
        };
        records.push(Record::new(point_id, timestamp, flags, value));
    }

    let mut encoder = Encoder::with_capacity(1 << 16);
    for record in &records {
        encoder.encode_record(record).unwrap();
    }
    let encoder_states = encoder.point_states().to_vec();
    let bytes = encoder.finish().unwrap();

    let mut decoder = Decoder::new(&bytes);
    for record in &records {
        assert_eq!(decoder.decode_record().unwrap(), Some(*record));
    }
    // The end-of-stream symbol has not been consumed yet, so the decoder
    // mirrors the encoder's pre-finish state exactly.
    assert_eq!(decoder.point_states(), encoder_states.as_slice());
    for state in decoder.point_states() {
        assert!(state.startup_mode() <= 3);
    }
}

// -------------------------------------------------------------- edge inputs

#[test]
fn point_id_xor_widths_cover_the_full_range() {
    let ids = [0u32, 5, 0x1234, 0xF_FFFF, 0xAB_CDEF, 0xFFFF_FFFF, 6];
    let records: Vec<Record> = ids
        .iter()
        .enumerate()
        .map(|(i, &id)| Record::new(id, BASE_TICKS + i as i64 * FRAME_TICKS, 0, 1.0))
        .collect();
    let bytes = encode_all(&records, 4096);
    assert_eq!(decode(&bytes).unwrap(), records);
}

#[test]
fn state_flags_slot_two_swaps() {
    let flags = [0u32, 0x4000, 0, 0x4000, 0, 0x4000];
    let records: Vec<Record> = flags
        .iter()
        .enumerate()
        .map(|(i, &f)| Record::new(2, BASE_TICKS + i as i64, f, 1.0))
        .collect();
    let bytes = encode_all(&records, 1024);
    assert_eq!(decode(&bytes).unwrap(), records);
}

#[test]
fn zero_and_negative_zero_values_are_distinct() {
    let records = vec![
        Record::new(1, BASE_TICKS, 0, 1.5),
        Record::new(1, BASE_TICKS + 1, 0, 0.0),
        Record::new(1, BASE_TICKS + 2, 0, -0.0),
        Record::new(1, BASE_TICKS + 3, 0, 0.0),
    ];
    let bytes = encode_all(&records, 1024);
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded[1].value.to_bits(), 0);
    assert_eq!(decoded[2].value.to_bits(), (-0.0f32).to_bits());
    assert_eq!(decoded[3].value.to_bits(), 0);
}

#[test]
fn nan_payloads_survive_bit_exactly() {
    let nan = f32::from_bits(0x7FC0_0001);
    let records = vec![
        Record::new(1, BASE_TICKS, 0, nan),
        Record::new(1, BASE_TICKS + 1, 0, nan),
    ];
    let mut encoder = Encoder::with_capacity(1024);
    for record in &records {
        encoder.encode_record(record).unwrap();
    }
    let decoded = decode(&encoder.finish().unwrap()).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].value.to_bits(), 0x7FC0_0001);
    assert_eq!(decoded[1].value.to_bits(), 0x7FC0_0001);
}

#[test]
fn leap_second_flag_bits_ride_through_the_codec() {
    let flagged = (Ticks::LEAP_SECOND_FLAG | Ticks::LEAP_SECOND_DIRECTION | BASE_TICKS as u64)
        as i64;
    let records = vec![
        Record::new(4, BASE_TICKS, 0, 1.0),
        Record::new(4, flagged, 0, 1.0),
        Record::new(4, BASE_TICKS + FRAME_TICKS, 0, 1.0),
    ];
    let bytes = encode_all(&records, 1024);
    assert_eq!(decode(&bytes).unwrap(), records);
}

// ------------------------------------------------------------------- errors

#[test]
fn truncated_buffer_is_a_truncated_stream() {
    let record = Record::new(1_234_567, BASE_TICKS, 0xFFFF, 1.5);
    let bytes = encode_all(&[record], 256);
    let mut decoder = Decoder::new(&bytes[..10]);
    assert_eq!(decoder.decode_record(), Err(DecodeError::TruncatedStream));
}

#[test]
fn empty_buffer_is_a_truncated_stream() {
    let mut decoder = Decoder::new(&[]);
    assert_eq!(decoder.decode_record(), Err(DecodeError::TruncatedStream));
}

#[test]
fn point_id_symbol_after_point_id_part_is_a_coding_error() {
    // PointIdXor4 (8 raw bits under the initial mode), a 4-bit residual,
    // then another PointIdXor4 where a timestamp-or-later symbol must
    // follow.
    let bytes: [u8; 3] = [0b0000_0001, 0b0101_0000, 0b0001_0000];
    let mut decoder = Decoder::new(&bytes);
    assert_eq!(decoder.decode_record(), Err(DecodeError::CodingError));
}

#[test]
fn capacity_smaller_than_the_end_reservation_cannot_finish() {
    let encoder = Encoder::with_capacity(0);
    assert_eq!(encoder.finish(), Err(EncodeError::BufferFull));
}

// -------------------------------------------------------------------- ticks

#[test]
fn ticks_unix_epoch_roundtrip() {
    assert_eq!(Ticks::from_unix_ns(0), Ticks(Ticks::UNIX_BASE_OFFSET));
    let ns = 1_700_000_000_123_456_700u64;
    let ticks = Ticks::from_unix_ns(ns);
    assert_eq!(ticks.to_unix_ns(), ns);
}

#[test]
fn ticks_leap_second_accessors() {
    let plain = Ticks::from_unix_ns(1_700_000_000_000_000_000);
    assert!(!plain.is_leap_second());

    let added = Ticks(plain.0 | Ticks::LEAP_SECOND_FLAG);
    assert!(added.is_leap_second());
    assert!(!added.is_negative_leap_second());
    assert_eq!(added.timestamp_value(), plain.0 as i64);

    let deleted = Ticks(plain.0 | Ticks::LEAP_SECOND_FLAG | Ticks::LEAP_SECOND_DIRECTION);
    assert!(deleted.is_negative_leap_second());
    assert_eq!(deleted.timestamp_value(), plain.0 as i64);
}

#[test]
fn ticks_value_mask_clears_only_flag_bits() {
    assert_eq!(
        Ticks::VALUE_MASK,
        !(Ticks::LEAP_SECOND_FLAG | Ticks::LEAP_SECOND_DIRECTION)
    );
    assert!(Ticks::MAX.0 <= Ticks::VALUE_MASK);
}
