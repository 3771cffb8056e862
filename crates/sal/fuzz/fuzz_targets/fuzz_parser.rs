//! Fuzz target for the worksheet parser.
//!
//! The parser must never panic on malformed input, whatever the delimiter.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sal::input::Parser;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    for delimiter in [b'\t', b',', b';', b'|'] {
        let _ = parser.parse_bytes(data, delimiter);
    }

    // Auto-detection goes through the file path
    if let Ok(mut temp_file) = tempfile::NamedTempFile::new() {
        if temp_file.write_all(data).is_ok() {
            let _ = parser.parse_file(temp_file.path());
        }
    }
});
