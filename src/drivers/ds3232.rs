//! DS3232 real-time-clock driver.
//!
//! Register-level protocol for the Maxim DS3232/DS3231 family, generic over
//! [`embedded_hal::i2c::I2c`] so the same code runs against the ESP-IDF I2C
//! driver on device and a fake bus in host tests. Time and alarm registers
//! are BCD; the weekday register is kept consistent with the calendar date
//! on every write (see [`DateTime::weekday`]).

use embedded_hal::i2c::I2c;

use crate::app::ports::{
    AlarmMode, AlarmSlot, ClockError, ClockPort, ClockStatus, DateTime, Temperature,
};

/// 7-bit bus address of the DS3232.
pub const DS3232_ADDR: u8 = 0x68;

// Register map.
const REG_SECONDS: u8 = 0x00;
const REG_ALARM1: u8 = 0x07;
const REG_ALARM2: u8 = 0x0B;
const REG_CONTROL: u8 = 0x0E;
const REG_STATUS: u8 = 0x0F;
const REG_TEMP_MSB: u8 = 0x11;

// Control register bits.
const CTRL_INTCN: u8 = 1 << 2;
const CTRL_A2IE: u8 = 1 << 1;
const CTRL_A1IE: u8 = 1 << 0;

// Status register bits.
const STAT_OSF: u8 = 1 << 7;
const STAT_EN32KHZ: u8 = 1 << 3;
const STAT_BSY: u8 = 1 << 2;
const STAT_A2F: u8 = 1 << 1;
const STAT_A1F: u8 = 1 << 0;

/// Alarm-mask bit: set on a BCD alarm register to ignore that field.
const ALARM_MASK: u8 = 1 << 7;

/// Two-digit packed BCD → binary.
pub fn bcd_to_bin(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Binary (0–99) → packed BCD.
pub fn bin_to_bcd(bin: u8) -> u8 {
    ((bin / 10) << 4) | (bin % 10)
}

/// DS3232 over any embedded-hal I2C bus.
pub struct Ds3232<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds3232<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Borrow the underlying bus. The RTC is the bus master's only
    /// permanent occupant; the `twiscan` sweep reuses its handle.
    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), ClockError> {
        self.i2c
            .write_read(DS3232_ADDR, &[reg], buf)
            .map_err(|_| ClockError::Bus)
    }

    fn write_regs(&mut self, reg: u8, data: &[u8]) -> Result<(), ClockError> {
        // Register pointer + up to seven payload bytes (the full time block).
        let mut frame = heapless::Vec::<u8, 8>::new();
        frame.push(reg).map_err(|_| ClockError::Bus)?;
        frame
            .extend_from_slice(data)
            .map_err(|_| ClockError::Bus)?;
        self.i2c
            .write(DS3232_ADDR, &frame)
            .map_err(|_| ClockError::Bus)
    }

    fn update_control(&mut self, clear: u8, set: u8) -> Result<u8, ClockError> {
        let mut ctrl = [0u8; 1];
        self.read_regs(REG_CONTROL, &mut ctrl)?;
        let updated = (ctrl[0] & !clear) | set;
        self.write_regs(REG_CONTROL, &[updated])?;
        Ok(updated)
    }
}

impl<I2C: I2c> ClockPort for Ds3232<I2C> {
    fn get_time(&mut self) -> Result<DateTime, ClockError> {
        let mut regs = [0u8; 7];
        self.read_regs(REG_SECONDS, &mut regs)?;
        Ok(DateTime {
            second: bcd_to_bin(regs[0] & 0x7F),
            minute: bcd_to_bin(regs[1] & 0x7F),
            // 24-hour mode is enforced by set_time; mask the mode bit.
            hour: bcd_to_bin(regs[2] & 0x3F),
            day: bcd_to_bin(regs[4] & 0x3F),
            month: bcd_to_bin(regs[5] & 0x1F),
            year: bcd_to_bin(regs[6]),
        })
    }

    fn set_time(&mut self, t: &DateTime) -> Result<(), ClockError> {
        t.validate()?;
        let regs = [
            bin_to_bcd(t.second),
            bin_to_bcd(t.minute),
            bin_to_bcd(t.hour), // bit 6 clear: 24-hour mode
            t.weekday(),
            bin_to_bcd(t.day),
            bin_to_bcd(t.month),
            bin_to_bcd(t.year),
        ];
        self.write_regs(REG_SECONDS, &regs)
    }

    fn set_alarm(
        &mut self,
        slot: AlarmSlot,
        mode: AlarmMode,
        t: &DateTime,
    ) -> Result<(), ClockError> {
        t.validate()?;
        // The day/date register is always masked: alarms repeat daily at
        // most. PerMinute additionally masks every time field.
        let field_mask = match mode {
            AlarmMode::Daily => 0,
            AlarmMode::PerMinute => ALARM_MASK,
        };
        match slot {
            AlarmSlot::One => {
                let regs = [
                    bin_to_bcd(t.second) | field_mask,
                    bin_to_bcd(t.minute) | field_mask,
                    bin_to_bcd(t.hour) | field_mask,
                    ALARM_MASK,
                ];
                self.write_regs(REG_ALARM1, &regs)
            }
            AlarmSlot::Two => {
                let regs = [
                    bin_to_bcd(t.minute) | field_mask,
                    bin_to_bcd(t.hour) | field_mask,
                    ALARM_MASK,
                ];
                self.write_regs(REG_ALARM2, &regs)
            }
        }
    }

    fn enable_alarm(&mut self, slot: AlarmSlot) -> Result<(), ClockError> {
        let ie = match slot {
            AlarmSlot::One => CTRL_A1IE,
            AlarmSlot::Two => CTRL_A2IE,
        };
        // INTCN routes alarm matches (not the square wave) to the INT pin.
        self.update_control(0, CTRL_INTCN | ie)?;
        Ok(())
    }

    fn disable_alarm(&mut self, slot: AlarmSlot) -> Result<bool, ClockError> {
        let (ie, flag) = match slot {
            AlarmSlot::One => (CTRL_A1IE, STAT_A1F),
            AlarmSlot::Two => (CTRL_A2IE, STAT_A2F),
        };
        self.update_control(ie, 0)?;

        let mut status = [0u8; 1];
        self.read_regs(REG_STATUS, &mut status)?;
        let fired = status[0] & flag != 0;
        if fired {
            // Write the flag back low; the INT line releases here.
            self.write_regs(REG_STATUS, &[status[0] & !flag])?;
        }
        Ok(fired)
    }

    fn temperature(&mut self) -> Result<Temperature, ClockError> {
        let mut regs = [0u8; 2];
        self.read_regs(REG_TEMP_MSB, &mut regs)?;
        Ok(Temperature {
            whole: regs[0] as i8,
            centi: (regs[1] >> 6) * 25,
        })
    }

    fn status(&mut self) -> Result<ClockStatus, ClockError> {
        let mut regs = [0u8; 2];
        self.read_regs(REG_CONTROL, &mut regs)?;
        let (control, status) = (regs[0], regs[1]);
        Ok(ClockStatus {
            oscillator_stopped: status & STAT_OSF != 0,
            output_32khz: status & STAT_EN32KHZ != 0,
            busy: status & STAT_BSY != 0,
            alarm1_enabled: control & CTRL_A1IE != 0,
            alarm2_enabled: control & CTRL_A2IE != 0,
            alarm1_fired: status & STAT_A1F != 0,
            alarm2_fired: status & STAT_A2F != 0,
        })
    }
}
