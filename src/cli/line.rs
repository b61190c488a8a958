//! Interrupt-fed line accumulator.
//!
//! Bytes arrive one at a time from the serial receive path (ISR or RX task);
//! the cooperative main loop collects whole lines. The handoff is a
//! single-producer/single-consumer flag-plus-buffer:
//!
//! ```text
//! ┌─────────────┐   feed(byte)    ┌────────────────┐  take_line()  ┌───────────┐
//! │ UART RX ISR │ ───────────────▶│ LineAccumulator │──────────────▶│ Main Loop │
//! └─────────────┘   (lock-free)   └────────────────┘  (non-block)  └───────────┘
//! ```
//!
//! The buffer is published with a Release store of the READY state and read
//! after an Acquire load, so a line is either fully written or not visible
//! at all — no partial-line dispatch is possible.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::error::{CommandError, Error};

/// Maximum accepted line length in bytes, terminator excluded.
pub const LINE_CAP: usize = 80;

// Accumulator states. FILLING is the only state in which the producer
// touches the buffer.
const STATE_FILLING: u8 = 0;
/// A complete line is waiting for the consumer.
const STATE_READY: u8 = 1;
/// The buffer overflowed; input is discarded until the next terminator.
const STATE_DISCARDING: u8 = 2;
/// An over-long line was terminated; the consumer must report it once.
const STATE_OVERFLOWED: u8 = 3;

/// Assembles received bytes into complete text lines.
pub struct LineAccumulator {
    buf: UnsafeCell<[u8; LINE_CAP]>,
    /// Bytes accumulated so far. Producer-owned while FILLING.
    len: AtomicUsize,
    state: AtomicU8,
}

// SAFETY: `buf` is written only by the single producer (`feed`) while the
// state is FILLING, and read only by the single consumer (`take_line`) after
// it observed READY with Acquire ordering. The producer's Release store of
// READY happens-before the consumer's buffer reads, and the consumer's
// Release store back to FILLING happens-before the producer's next write.
unsafe impl Sync for LineAccumulator {}

impl LineAccumulator {
    pub const fn new() -> Self {
        Self {
            buf: UnsafeCell::new([0; LINE_CAP]),
            len: AtomicUsize::new(0),
            state: AtomicU8::new(STATE_FILLING),
        }
    }

    fn is_terminator(byte: u8) -> bool {
        byte == b'\r' || byte == b'\n'
    }

    /// Feed one received byte.
    ///
    /// Safe to call from ISR context: lock-free, non-blocking, no
    /// allocation. While a finished line awaits collection, further bytes
    /// are dropped (single-line latch); the LF of a CRLF pair lands here or
    /// as a spurious empty line, both of which are harmless.
    pub fn feed(&self, byte: u8) {
        match self.state.load(Ordering::Acquire) {
            STATE_READY | STATE_OVERFLOWED => {}
            STATE_DISCARDING => {
                if Self::is_terminator(byte) {
                    self.state.store(STATE_OVERFLOWED, Ordering::Release);
                }
            }
            _ => {
                if Self::is_terminator(byte) {
                    self.state.store(STATE_READY, Ordering::Release);
                    return;
                }
                let len = self.len.load(Ordering::Relaxed);
                if len >= LINE_CAP {
                    // Full before a terminator: the whole line is void.
                    self.len.store(0, Ordering::Relaxed);
                    self.state.store(STATE_DISCARDING, Ordering::Release);
                    return;
                }
                // SAFETY: sole producer, state is FILLING, len < LINE_CAP.
                unsafe {
                    (*self.buf.get())[len] = byte;
                }
                self.len.store(len + 1, Ordering::Relaxed);
            }
        }
    }

    /// Collect a finished line, if any. Non-blocking; called from the main
    /// loop only.
    ///
    /// Returns `None` while no line is ready, `Some(Ok(line))` for a
    /// completed line (possibly empty), and `Some(Err(LineTooLong))` exactly
    /// once after an over-long line was discarded.
    pub fn take_line(&self) -> Option<Result<String, Error>> {
        match self.state.load(Ordering::Acquire) {
            STATE_READY => {
                let len = self.len.load(Ordering::Relaxed);
                // SAFETY: the producer published READY and will not write
                // until we store FILLING below.
                let bytes = unsafe { &(&(*self.buf.get()))[..len] };
                let line = String::from_utf8_lossy(bytes).into_owned();
                self.len.store(0, Ordering::Relaxed);
                self.state.store(STATE_FILLING, Ordering::Release);
                Some(Ok(line))
            }
            STATE_OVERFLOWED => {
                self.len.store(0, Ordering::Relaxed);
                self.state.store(STATE_FILLING, Ordering::Release);
                Some(Err(CommandError::LineTooLong.into()))
            }
            _ => None,
        }
    }
}

impl Default for LineAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
