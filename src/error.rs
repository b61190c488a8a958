//! Unified error types for the outlet-timer firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! command loop's error handling uniform. All variants are `Copy` so they
//! can be passed around without allocation; nothing in this taxonomy is
//! fatal — every error is recovered at the command boundary and the main
//! loop returns to waiting for the next line.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The command interpreter rejected the input.
    Command(CommandError),
    /// The RTC could not be read or written.
    Clock(ClockError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "{e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command interpreter errors
// ---------------------------------------------------------------------------

/// Rejections produced while accumulating, parsing, or dispatching a
/// command line. Surfaced to the operator as text; never terminate the
/// interpreter loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Input exceeded the line buffer before a terminator arrived.
    /// The buffer was reset; the rest of the line was discarded.
    LineTooLong,
    /// The command name matched no registry entry.
    UnknownCommand,
    /// Argument count outside the command's declared bounds.
    ArgumentCount { min: u8, max: u8, given: u8 },
    /// An argument expected to be numeric was not. `index` is 1-based.
    ArgumentFormat { index: u8 },
    /// The event store is at capacity; nothing was written.
    StoreFull,
    /// The persisted event table is erased (0xFF sentinel). Informational.
    NoEventsConfigured,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineTooLong => write!(f, "input line too long"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::ArgumentCount { min, max, given } if min == max => {
                write!(f, "expected {min} argument(s), got {given}")
            }
            Self::ArgumentCount { min, max, given } => {
                write!(f, "expected {min} to {max} arguments, got {given}")
            }
            Self::ArgumentFormat { index } => {
                write!(f, "argument {index} is not a valid number")
            }
            Self::StoreFull => write!(f, "event store is full"),
            Self::NoEventsConfigured => write!(f, "no events configured"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Clock peripheral errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The I2C transaction to the RTC failed.
    Bus,
    /// A time field is out of range for the RTC registers.
    /// The `&'static str` names the offending field.
    InvalidField(&'static str),
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus transaction failed"),
            Self::InvalidField(field) => write!(f, "invalid {field}"),
        }
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

// ---------------------------------------------------------------------------
// Persistent storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access past the end of the storage region.
    OutOfBounds,
    /// Generic I/O error from the storage backend.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of range"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
