//! Fuzz target: `LineAccumulator::feed` / `take_line`
//!
//! Drives arbitrary byte sequences into the accumulator and asserts that
//! it never panics, never yields a line longer than the buffer capacity,
//! and always returns to a usable state afterwards.
//!
//! cargo fuzz run fuzz_line_accumulator

#![no_main]

use libfuzzer_sys::fuzz_target;
use outlet_timer::cli::line::{LINE_CAP, LineAccumulator};

fuzz_target!(|data: &[u8]| {
    let acc = LineAccumulator::new();

    for &byte in data {
        acc.feed(byte);
        if let Some(Ok(line)) = acc.take_line() {
            assert!(line.len() <= LINE_CAP, "line exceeds LINE_CAP");
        }
    }

    // Whatever state the input left behind, a terminated line must still
    // come through afterwards. Flush any partial or discarded input first,
    // then drain the pending results.
    acc.feed(b'\r');
    while acc.take_line().is_some() {}
    for &byte in b"gettime\r" {
        acc.feed(byte);
    }
    let line = acc.take_line().expect("line must be ready");
    assert_eq!(line.expect("line must be clean"), "gettime");
});
