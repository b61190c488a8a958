//! Hardware adapter — bridges real peripherals to the domain port traits.
//!
//! This is the only module in the system that touches actual hardware:
//! the DS3232 RTC on the I2C bus, the four output GPIOs, and the buzzer's
//! LEDC channel.
//!
//! ## Dual-target design
//!
//! - **`target_os = "espidf"`** — real peripherals via `esp-idf-hal`.
//! - **`not(target_os = "espidf")`** — an in-memory simulation backend with
//!   inspection accessors, used by the host test suite.

use crate::app::ports::{
    AlarmMode, AlarmSlot, BusPort, BuzzerPort, ClockError, ClockPort, ClockStatus, DateTime,
    OUTPUT_COUNT, OutputPort, Temperature,
};

#[cfg(target_os = "espidf")]
use crate::drivers::ds3232::Ds3232;
#[cfg(target_os = "espidf")]
use esp_idf_hal::delay::{BLOCK, FreeRtos};
#[cfg(target_os = "espidf")]
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
#[cfg(target_os = "espidf")]
use esp_idf_hal::i2c::I2cDriver;
#[cfg(target_os = "espidf")]
use esp_idf_hal::ledc::LedcDriver;

// ── Simulation state (host backend) ───────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy, Default)]
struct SimAlarm {
    armed: Option<(AlarmMode, u8, u8)>,
    enabled: bool,
    fired: bool,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
struct SimState {
    now: DateTime,
    outputs: [bool; OUTPUT_COUNT as usize],
    last_buzz: Option<u16>,
    alarms: [SimAlarm; 2],
    bus_devices: heapless::Vec<u8, 16>,
}

#[cfg(not(target_os = "espidf"))]
impl SimState {
    fn new() -> Self {
        let mut bus_devices = heapless::Vec::new();
        // The RTC is the only stock bus occupant.
        let _ = bus_devices.push(crate::drivers::ds3232::DS3232_ADDR);
        Self {
            now: DateTime {
                month: 1,
                day: 1,
                year: 0,
                hour: 0,
                minute: 0,
                second: 0,
            },
            outputs: [false; OUTPUT_COUNT as usize],
            last_buzz: None,
            alarms: [SimAlarm::default(); 2],
            bus_devices,
        }
    }

    fn alarm(&mut self, slot: AlarmSlot) -> &mut SimAlarm {
        match slot {
            AlarmSlot::One => &mut self.alarms[0],
            AlarmSlot::Two => &mut self.alarms[1],
        }
    }
}

// ── Adapter ───────────────────────────────────────────────────

/// Concrete adapter that combines all hardware behind the port traits.
pub struct HardwareAdapter {
    #[cfg(target_os = "espidf")]
    rtc: Ds3232<I2cDriver<'static>>,
    #[cfg(target_os = "espidf")]
    outputs: [PinDriver<'static, AnyOutputPin, Output>; OUTPUT_COUNT as usize],
    #[cfg(target_os = "espidf")]
    buzzer: LedcDriver<'static>,

    #[cfg(not(target_os = "espidf"))]
    sim: SimState,
}

#[cfg(target_os = "espidf")]
impl HardwareAdapter {
    /// Assemble the adapter from initialised peripherals.
    pub fn new(
        rtc: Ds3232<I2cDriver<'static>>,
        outputs: [PinDriver<'static, AnyOutputPin, Output>; OUTPUT_COUNT as usize],
        buzzer: LedcDriver<'static>,
    ) -> Self {
        Self {
            rtc,
            outputs,
            buzzer,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl HardwareAdapter {
    pub fn new() -> Self {
        Self {
            sim: SimState::new(),
        }
    }

    // Inspection accessors for the host test suite.

    pub fn set_now(&mut self, now: DateTime) {
        self.sim.now = now;
    }

    pub fn outputs(&self) -> [bool; OUTPUT_COUNT as usize] {
        self.sim.outputs
    }

    pub fn last_buzz(&self) -> Option<u16> {
        self.sim.last_buzz
    }

    pub fn armed_alarm(&self, slot: AlarmSlot) -> Option<(AlarmMode, u8, u8)> {
        match slot {
            AlarmSlot::One => self.sim.alarms[0].armed,
            AlarmSlot::Two => self.sim.alarms[1].armed,
        }
    }

    pub fn alarm_enabled(&self, slot: AlarmSlot) -> bool {
        match slot {
            AlarmSlot::One => self.sim.alarms[0].enabled,
            AlarmSlot::Two => self.sim.alarms[1].enabled,
        }
    }

    /// Simulate the comparator matching (sets the fired flag).
    pub fn raise_alarm(&mut self, slot: AlarmSlot) {
        self.sim.alarm(slot).fired = true;
    }

    pub fn set_bus_devices(&mut self, addrs: &[u8]) {
        self.sim.bus_devices.clear();
        let _ = self.sim.bus_devices.extend_from_slice(addrs);
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── ClockPort ─────────────────────────────────────────────────

impl ClockPort for HardwareAdapter {
    fn get_time(&mut self) -> Result<DateTime, ClockError> {
        #[cfg(target_os = "espidf")]
        {
            self.rtc.get_time()
        }
        #[cfg(not(target_os = "espidf"))]
        {
            Ok(self.sim.now)
        }
    }

    fn set_time(&mut self, t: &DateTime) -> Result<(), ClockError> {
        t.validate()?;
        #[cfg(target_os = "espidf")]
        {
            self.rtc.set_time(t)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.now = *t;
            Ok(())
        }
    }

    fn set_alarm(
        &mut self,
        slot: AlarmSlot,
        mode: AlarmMode,
        t: &DateTime,
    ) -> Result<(), ClockError> {
        t.validate()?;
        #[cfg(target_os = "espidf")]
        {
            self.rtc.set_alarm(slot, mode, t)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.alarm(slot).armed = Some((mode, t.hour, t.minute));
            Ok(())
        }
    }

    fn enable_alarm(&mut self, slot: AlarmSlot) -> Result<(), ClockError> {
        #[cfg(target_os = "espidf")]
        {
            self.rtc.enable_alarm(slot)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.alarm(slot).enabled = true;
            Ok(())
        }
    }

    fn disable_alarm(&mut self, slot: AlarmSlot) -> Result<bool, ClockError> {
        #[cfg(target_os = "espidf")]
        {
            self.rtc.disable_alarm(slot)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            let alarm = self.sim.alarm(slot);
            let fired = alarm.fired;
            alarm.fired = false;
            alarm.enabled = false;
            Ok(fired)
        }
    }

    fn temperature(&mut self) -> Result<Temperature, ClockError> {
        #[cfg(target_os = "espidf")]
        {
            self.rtc.temperature()
        }
        #[cfg(not(target_os = "espidf"))]
        {
            Ok(Temperature {
                whole: 22,
                centi: 25,
            })
        }
    }

    fn status(&mut self) -> Result<ClockStatus, ClockError> {
        #[cfg(target_os = "espidf")]
        {
            self.rtc.status()
        }
        #[cfg(not(target_os = "espidf"))]
        {
            Ok(ClockStatus {
                oscillator_stopped: false,
                output_32khz: false,
                busy: false,
                alarm1_enabled: self.sim.alarms[0].enabled,
                alarm2_enabled: self.sim.alarms[1].enabled,
                alarm1_fired: self.sim.alarms[0].fired,
                alarm2_fired: self.sim.alarms[1].fired,
            })
        }
    }
}

// ── OutputPort ────────────────────────────────────────────────

impl OutputPort for HardwareAdapter {
    fn set_output(&mut self, id: u8, on: bool) {
        if id >= OUTPUT_COUNT {
            return;
        }
        #[cfg(target_os = "espidf")]
        {
            let pin = &mut self.outputs[usize::from(id)];
            let result = if on { pin.set_high() } else { pin.set_low() };
            if let Err(e) = result {
                log::warn!("output {id}: GPIO write failed: {e}");
            }
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.outputs[usize::from(id)] = on;
        }
    }
}

// ── BuzzerPort ────────────────────────────────────────────────

impl BuzzerPort for HardwareAdapter {
    fn buzz(&mut self, duration_ms: u16) {
        #[cfg(target_os = "espidf")]
        {
            // 50% duty on the 4 kHz LEDC channel for the duration.
            let half = self.buzzer.get_max_duty() / 2;
            if self.buzzer.set_duty(half).is_ok() {
                FreeRtos::delay_ms(u32::from(duration_ms));
                let _ = self.buzzer.set_duty(0);
            }
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.last_buzz = Some(duration_ms);
        }
    }
}

// ── BusPort ───────────────────────────────────────────────────

impl BusPort for HardwareAdapter {
    fn scan(&mut self) -> heapless::Vec<u8, 16> {
        #[cfg(target_os = "espidf")]
        {
            // The RTC shares the bus; borrow it for an address sweep. An
            // empty write that ACKs means a device answered.
            let mut found = heapless::Vec::new();
            for addr in 0x08..=0x77u8 {
                if self.rtc.bus_mut().write(addr, &[], BLOCK).is_ok() && found.push(addr).is_err()
                {
                    break;
                }
            }
            found
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.bus_devices.clone()
        }
    }
}
