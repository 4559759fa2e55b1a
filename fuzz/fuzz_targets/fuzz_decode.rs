#![no_main]

use libfuzzer_sys::fuzz_target;
use tssc::Decoder;

// Arbitrary bytes must never panic the decoder: every outcome is a record,
// a clean end of stream, or a typed error.
fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::new(data);
    let mut records = 0usize;
    loop {
        match decoder.decode_record() {
            Ok(Some(_)) => {
                records += 1;
                // A record costs at least one symbol; bound the loop.
                assert!(records <= data.len() * 8 + 1);
            }
            Ok(None) => {
                // End of stream is sticky.
                assert!(matches!(decoder.decode_record(), Ok(None)));
                break;
            }
            Err(_) => break,
        }
    }
});
