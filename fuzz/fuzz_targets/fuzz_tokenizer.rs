//! Fuzz target: `tokenize`
//!
//! Arbitrary input lines must split without panicking, with the stored
//! token list consistent with the reported argument count.
//!
//! cargo fuzz run fuzz_tokenizer

#![no_main]

use libfuzzer_sys::fuzz_target;
use outlet_timer::cli::tokens::{MAX_ARGS, tokenize};

fuzz_target!(|line: &str| {
    let cmd = tokenize(line);

    assert!(cmd.args.len() <= MAX_ARGS);
    assert!(usize::from(cmd.arg_count) >= cmd.args.len());
    assert!(!cmd.name.chars().any(char::is_whitespace));
    for token in &cmd.args {
        assert!(!token.is_empty());
        assert!(!token.chars().any(char::is_whitespace));
    }
});
