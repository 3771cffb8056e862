//! Fuzz target for the Roman numeral codec.
//!
//! The decoder must never panic, and anything it accepts must encode back
//! to the same text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sal::numeral::{from_roman, to_roman};

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Some(value) = from_roman(text) {
            let encoded = to_roman(value).expect("decoded value is in range");
            assert!(encoded.eq_ignore_ascii_case(text.trim()));
        }
    }

    if data.len() >= 4 {
        let value = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if let Ok(roman) = to_roman(value) {
            assert_eq!(from_roman(&roman), Some(value));
        }
    }
});
