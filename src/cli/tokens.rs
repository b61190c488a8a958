//! Line tokenizer and argument conversion helpers.
//!
//! Splitting is purely textual: the first whitespace-delimited token is the
//! command name (case-sensitive), the rest are argument strings. Numeric
//! conversion is deferred to each handler via [`int_arg`]/[`mask_arg`], so a
//! bad argument is reported with its 1-based position on the line.

use core::str::FromStr;

use crate::error::{CommandError, Error, Result};

/// Upper bound on stored argument tokens. The widest registered command
/// (`settime`) takes six; anything past this is still *counted* so the
/// dispatcher can report an accurate argument-count error.
pub const MAX_ARGS: usize = 8;

/// One completed input line, split. Borrows from the raw line; created on
/// line completion and discarded right after dispatch.
#[derive(Debug)]
pub struct CommandLine<'a> {
    /// Command name; empty for a blank line (which dispatches nothing).
    pub name: &'a str,
    /// Argument tokens, capped at [`MAX_ARGS`].
    pub args: heapless::Vec<&'a str, MAX_ARGS>,
    /// Total argument tokens on the line, including any beyond [`MAX_ARGS`].
    pub arg_count: u8,
}

/// Split a line on whitespace runs.
pub fn tokenize(line: &str) -> CommandLine<'_> {
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or("");
    let mut args = heapless::Vec::new();
    let mut arg_count: u8 = 0;
    for token in parts {
        // Overflowing tokens are counted but not stored; every registered
        // command's max_args fits well inside MAX_ARGS, so the dispatcher
        // rejects such lines before a handler could miss them.
        let _ = args.push(token);
        arg_count = arg_count.saturating_add(1);
    }
    CommandLine {
        name,
        args,
        arg_count,
    }
}

/// Parse argument `index` (1-based) as an integer.
pub fn int_arg<T: FromStr>(args: &[&str], index: usize) -> Result<T> {
    args.get(index - 1)
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| {
            Error::Command(CommandError::ArgumentFormat {
                index: index as u8,
            })
        })
}

/// Parse argument `index` (1-based) as a bitmask byte, accepting decimal or
/// `0x`-prefixed hex (day and output masks are conventionally given in hex).
pub fn mask_arg(args: &[&str], index: usize) -> Result<u8> {
    let err = Error::Command(CommandError::ArgumentFormat {
        index: index as u8,
    });
    let s = args.get(index - 1).ok_or(err)?;
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|_| err)
}
