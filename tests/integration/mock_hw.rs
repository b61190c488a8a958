//! Recording mocks for integration tests.
//!
//! Every port call is appended to a history so tests can assert on the
//! full call sequence without touching real peripherals.

use std::collections::VecDeque;

use outlet_timer::app::ports::{
    AlarmMode, AlarmSlot, BusPort, BuzzerPort, ClockError, ClockPort, ClockStatus, ConsolePort,
    DateTime, OutputPort, Temperature,
};
use outlet_timer::error::Result;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwCall {
    SetTime(DateTime),
    SetAlarm {
        slot: AlarmSlot,
        mode: AlarmMode,
        hour: u8,
        minute: u8,
    },
    EnableAlarm(AlarmSlot),
    DisableAlarm(AlarmSlot),
    SetOutput {
        id: u8,
        on: bool,
    },
    Buzz(u16),
    Scan,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub now: DateTime,
    pub status: ClockStatus,
    pub bus_devices: Vec<u8>,
    /// When set, every clock transaction fails with a bus error.
    pub fail_clock: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            now: DateTime {
                month: 6,
                day: 15,
                year: 24,
                hour: 12,
                minute: 0,
                second: 0,
            },
            status: ClockStatus::default(),
            bus_devices: vec![0x68],
            fail_clock: false,
        }
    }

    pub fn outputs_state(&self) -> [bool; 4] {
        let mut outputs = [false; 4];
        for call in &self.calls {
            if let HwCall::SetOutput { id, on } = call {
                if *id < 4 {
                    outputs[usize::from(*id)] = *on;
                }
            }
        }
        outputs
    }

    pub fn buzzes(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Buzz(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    fn clock_guard(&self) -> std::result::Result<(), ClockError> {
        if self.fail_clock {
            Err(ClockError::Bus)
        } else {
            Ok(())
        }
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockHardware {
    fn get_time(&mut self) -> std::result::Result<DateTime, ClockError> {
        self.clock_guard()?;
        Ok(self.now)
    }

    fn set_time(&mut self, t: &DateTime) -> std::result::Result<(), ClockError> {
        self.clock_guard()?;
        self.calls.push(HwCall::SetTime(*t));
        self.now = *t;
        Ok(())
    }

    fn set_alarm(
        &mut self,
        slot: AlarmSlot,
        mode: AlarmMode,
        t: &DateTime,
    ) -> std::result::Result<(), ClockError> {
        self.clock_guard()?;
        self.calls.push(HwCall::SetAlarm {
            slot,
            mode,
            hour: t.hour,
            minute: t.minute,
        });
        Ok(())
    }

    fn enable_alarm(&mut self, slot: AlarmSlot) -> std::result::Result<(), ClockError> {
        self.clock_guard()?;
        self.calls.push(HwCall::EnableAlarm(slot));
        match slot {
            AlarmSlot::One => self.status.alarm1_enabled = true,
            AlarmSlot::Two => self.status.alarm2_enabled = true,
        }
        Ok(())
    }

    fn disable_alarm(&mut self, slot: AlarmSlot) -> std::result::Result<bool, ClockError> {
        self.clock_guard()?;
        self.calls.push(HwCall::DisableAlarm(slot));
        let fired = match slot {
            AlarmSlot::One => {
                let f = self.status.alarm1_fired;
                self.status.alarm1_fired = false;
                self.status.alarm1_enabled = false;
                f
            }
            AlarmSlot::Two => {
                let f = self.status.alarm2_fired;
                self.status.alarm2_fired = false;
                self.status.alarm2_enabled = false;
                f
            }
        };
        Ok(fired)
    }

    fn temperature(&mut self) -> std::result::Result<Temperature, ClockError> {
        self.clock_guard()?;
        Ok(Temperature {
            whole: 21,
            centi: 75,
        })
    }

    fn status(&mut self) -> std::result::Result<ClockStatus, ClockError> {
        self.clock_guard()?;
        Ok(self.status)
    }
}

impl OutputPort for MockHardware {
    fn set_output(&mut self, id: u8, on: bool) {
        self.calls.push(HwCall::SetOutput { id, on });
    }
}

impl BuzzerPort for MockHardware {
    fn buzz(&mut self, duration_ms: u16) {
        self.calls.push(HwCall::Buzz(duration_ms));
    }
}

impl BusPort for MockHardware {
    fn scan(&mut self) -> heapless::Vec<u8, 16> {
        self.calls.push(HwCall::Scan);
        let mut found = heapless::Vec::new();
        for addr in &self.bus_devices {
            let _ = found.push(*addr);
        }
        found
    }
}

// ── ScriptedConsole ───────────────────────────────────────────

/// Console with queued input lines and captured output.
pub struct ScriptedConsole {
    input: VecDeque<String>,
    pub output: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedConsole {
    pub fn new() -> Self {
        Self {
            input: VecDeque::new(),
            output: Vec::new(),
        }
    }

    pub fn with_input(lines: &[&str]) -> Self {
        Self {
            input: lines.iter().map(|s| (*s).to_string()).collect(),
            output: Vec::new(),
        }
    }

    pub fn printed(&self, needle: &str) -> bool {
        self.output.iter().any(|l| l.contains(needle))
    }
}

impl Default for ScriptedConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePort for ScriptedConsole {
    fn write_line(&mut self, line: &str) {
        self.output.push(line.to_string());
    }

    fn read_line(&mut self) -> Result<String> {
        Ok(self.input.pop_front().unwrap_or_default())
    }
}
