#![no_main]

use libfuzzer_sys::fuzz_target;
use tssc::{decode, Encoder, Record};

const BASE_TICKS: i64 = 638_000_000_000_000_000;

// Bytes are interpreted as (id: u8, ts_step: u16, flags: u8, value: u32)
// rows; whatever stream results must round-trip bit-exactly.
fuzz_target!(|data: &[u8]| {
    let mut records = Vec::new();
    let mut timestamp = BASE_TICKS;
    for chunk in data.chunks(8) {
        if chunk.len() < 8 {
            break;
        }
        let step = i64::from(u16::from_le_bytes([chunk[1], chunk[2]]));
        timestamp = timestamp.wrapping_add(step);
        records.push(Record {
            point_id: u32::from(chunk[0]),
            timestamp,
            state_flags: u32::from(chunk[3]),
            value: f32::from_bits(u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]])),
        });
    }

    let mut encoder = Encoder::with_capacity(records.len() * 32 + 64);
    for record in &records {
        encoder.encode_record(record).expect("capacity is sized to fit");
    }
    let bytes = encoder.finish().expect("finish always fits the reservation");

    let decoded = decode(&bytes).expect("own output must decode");
    assert_eq!(decoded.len(), records.len());
    for (d, r) in decoded.iter().zip(records.iter()) {
        assert_eq!(d.point_id, r.point_id);
        assert_eq!(d.timestamp, r.timestamp);
        assert_eq!(d.state_flags, r.state_flags);
        assert_eq!(d.value.to_bits(), r.value.to_bits());
    }
});
