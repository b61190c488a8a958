//! Command interpreter.
//!
//! The interactive surface of the device: bytes from the serial line are
//! accumulated into lines ([`line`]), split into a command name plus
//! argument tokens ([`tokens`]), resolved against the fixed command table
//! and validated ([`registry`]), and executed ([`handlers`]).
//!
//! ```text
//! bytes ─▶ LineAccumulator ─▶ tokenize ─▶ dispatch ─▶ handler
//!            (ISR-fed)                    (registry)   (ports)
//! ```

pub mod handlers;
pub mod line;
pub mod registry;
pub mod tokens;
