//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ command handlers / AppService (domain)
//! ```
//!
//! Driven adapters (RTC, outputs, buzzer, bus, storage, console) implement
//! these traits. The command handlers consume them through the explicit
//! [`Console`](crate::cli::registry::Console) context, so the domain core
//! never touches hardware directly and every handler is testable with mock
//! ports.

use core::fmt;

use crate::error::Error;
// Port error types live in the firmware-wide taxonomy; re-exported here so
// adapters can name them next to the traits they implement.
pub use crate::error::{ClockError, StorageError};

/// Number of timer-controlled digital outputs. Output ids are `0..OUTPUT_COUNT`;
/// bit *k* of an event's output mask drives output *k*.
pub const OUTPUT_COUNT: u8 = 4;

// ───────────────────────────────────────────────────────────────
// Clock value types
// ───────────────────────────────────────────────────────────────

/// A calendar timestamp as the RTC stores it (two-digit year, 20xx).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub month: u8,
    pub day: u8,
    /// Two-digit year; the device displays `20YY`.
    pub year: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Range-check every field against what the RTC registers can hold.
    pub fn validate(&self) -> Result<(), ClockError> {
        if self.month == 0 || self.month > 12 {
            return Err(ClockError::InvalidField("month"));
        }
        if self.day == 0 || self.day > 31 {
            return Err(ClockError::InvalidField("day"));
        }
        if self.year > 99 {
            return Err(ClockError::InvalidField("year"));
        }
        if self.hour > 23 {
            return Err(ClockError::InvalidField("hour"));
        }
        if self.minute > 59 {
            return Err(ClockError::InvalidField("minute"));
        }
        if self.second > 59 {
            return Err(ClockError::InvalidField("second"));
        }
        Ok(())
    }

    /// Hour and minute collapsed to a single ascending ordering key.
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Day of week, 1–7 with 1 = Sunday (Sakamoto's method).
    ///
    /// The RTC's day register is free-running and user-defined; the firmware
    /// derives the weekday from the calendar date whenever it sets the clock,
    /// so the register always follows this convention.
    pub fn weekday(&self) -> u8 {
        const T: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let mut y = 2000u16 + u16::from(self.year);
        if self.month < 3 {
            y -= 1;
        }
        let dow =
            (y + y / 4 - y / 100 + y / 400 + T[usize::from(self.month) - 1] + u16::from(self.day))
                % 7;
        dow as u8 + 1
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/20{:02} {:02}:{:02}:{:02}",
            self.month, self.day, self.year, self.hour, self.minute, self.second
        )
    }
}

/// Die temperature in 0.25 °C steps, split the way the RTC reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature {
    pub whole: i8,
    /// Fractional part in hundredths: 0, 25, 50 or 75.
    pub centi: u8,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.whole, self.centi)
    }
}

/// Snapshot of the RTC control/status registers, decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockStatus {
    /// The oscillator stopped at some point (time may be invalid).
    pub oscillator_stopped: bool,
    /// 32 kHz output pin enabled.
    pub output_32khz: bool,
    /// Temperature conversion in progress.
    pub busy: bool,
    pub alarm1_enabled: bool,
    pub alarm2_enabled: bool,
    pub alarm1_fired: bool,
    pub alarm2_fired: bool,
}

/// The RTC's two alarm comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSlot {
    One,
    Two,
}

/// How an alarm comparator matches the running time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMode {
    /// Match hours and minutes (and seconds, on slot 1) — fires once a day.
    Daily,
    /// Ignore every field — fires once a minute (slot 2) or second (slot 1).
    PerMinute,
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC chip → domain)
// ───────────────────────────────────────────────────────────────

/// Read/write access to the real-time-clock peripheral.
pub trait ClockPort {
    fn get_time(&mut self) -> Result<DateTime, ClockError>;

    fn set_time(&mut self, t: &DateTime) -> Result<(), ClockError>;

    /// Program an alarm comparator. Does not enable its interrupt.
    fn set_alarm(&mut self, slot: AlarmSlot, mode: AlarmMode, t: &DateTime)
    -> Result<(), ClockError>;

    /// Route the alarm's match to the interrupt line.
    fn enable_alarm(&mut self, slot: AlarmSlot) -> Result<(), ClockError>;

    /// Mask the alarm interrupt and clear its fired flag.
    /// Returns whether the flag was set (i.e. this alarm had fired).
    fn disable_alarm(&mut self, slot: AlarmSlot) -> Result<bool, ClockError>;

    fn temperature(&mut self) -> Result<Temperature, ClockError>;

    fn status(&mut self) -> Result<ClockStatus, ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Output / buzzer / bus ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the timer-controlled digital outputs (LEDs, relay).
pub trait OutputPort {
    /// Drive a single output. Ids outside `0..OUTPUT_COUNT` are ignored.
    fn set_output(&mut self, id: u8, on: bool);

    /// Drive all outputs from a bitmask (bit *k* → output *k*).
    fn apply_mask(&mut self, mask: u8) {
        for id in 0..OUTPUT_COUNT {
            self.set_output(id, mask & (1 << id) != 0);
        }
    }
}

/// Piezo buzzer. `buzz` is synchronous and blocks for the duration.
pub trait BuzzerPort {
    fn buzz(&mut self, duration_ms: u16);
}

/// I2C bus enumeration for the `twiscan` command.
pub trait BusPort {
    /// Probe the bus and return the responding 7-bit addresses.
    fn scan(&mut self) -> heapless::Vec<u8, 16>;
}

/// Everything the command handlers need from the hardware, as one seam so a
/// single adapter can be borrowed mutably once and used through all four
/// port traits without a double mutable borrow.
pub trait HardwarePorts: ClockPort + OutputPort + BuzzerPort + BusPort {}

impl<T: ClockPort + OutputPort + BuzzerPort + BusPort> HardwarePorts for T {}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ non-volatile storage)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable non-volatile storage.
///
/// Erased bytes read `0xFF` — the event table and config region both rely on
/// that sentinel to detect first boot. Writes must be whole-range or fail;
/// no partial write may be observable after a successful return.
pub trait StoragePort {
    /// Fill `buf` from `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Total usable size in bytes.
    fn capacity(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Console port (driving adapter: operator ↔ domain)
// ───────────────────────────────────────────────────────────────

/// The operator-facing text surface. Output is line-oriented; `read_line`
/// blocks cooperatively until the operator finishes a line (used by the
/// `events` follow-up prompt).
pub trait ConsolePort {
    fn write_line(&mut self, line: &str);

    fn read_line(&mut self) -> Result<String, Error>;
}
