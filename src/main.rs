//! Outlet-timer firmware — main entry point (ESP-IDF target).
//!
//! Bring-up order: logger → peripherals → storage → config → event table →
//! RTC interrupt hookup → console → cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  HardwareAdapter        NvsStorage        SerialConsole    │
//! │  (Clock+Output+         (StoragePort)     (ConsolePort)    │
//! │   Buzzer+Bus)                                              │
//! │                                                            │
//! │  ────────────── Port Trait Boundary ──────────────         │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │        AppService (interpreter + scheduler)          │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                                                            │
//! │  LineAccumulator ◀── UART RX thread                        │
//! │  alarm::post()   ◀── RTC INT pin ISR                       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pin map (ESP32-S3 devkit):
//! - GPIO8/GPIO9 — I2C SDA/SCL (DS3232, address 0x68)
//! - GPIO3       — RTC INT (open drain, pull-up, falling edge)
//! - GPIO4       — output 0 (relay)
//! - GPIO5/6/7   — outputs 1–3 (LEDs)
//! - GPIO10      — buzzer (LEDC, 4 kHz)
//! - GPIO17/18   — UART1 TX/RX (operator console, 115200 8N1)

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, InterruptType, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};

use outlet_timer::adapters::hardware::HardwareAdapter;
use outlet_timer::adapters::nvs::NvsStorage;
use outlet_timer::adapters::serial::SerialConsole;
use outlet_timer::alarm;
use outlet_timer::app::ports::ConsolePort;
use outlet_timer::app::service::AppService;
use outlet_timer::cli::line::LineAccumulator;
use outlet_timer::config;
use outlet_timer::drivers::ds3232::Ds3232;
use outlet_timer::error::{CommandError, Error};
use outlet_timer::scheduler::EventStore;

/// Byte handoff between the UART RX thread and the main loop. Static so
/// the ISR-side context can reach it without allocation.
static LINES: LineAccumulator = LineAccumulator::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().map_err(|e| anyhow!("logger init failed: {e:?}"))?;

    info!("outlet-timer v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    let p = Peripherals::take().context("peripherals already taken")?;

    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio8,
        p.pins.gpio9,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )
    .context("I2C init")?;
    let rtc = Ds3232::new(i2c);

    let outputs = [
        PinDriver::output(p.pins.gpio4.downgrade_output()).context("output 0")?,
        PinDriver::output(p.pins.gpio5.downgrade_output()).context("output 1")?,
        PinDriver::output(p.pins.gpio6.downgrade_output()).context("output 2")?,
        PinDriver::output(p.pins.gpio7.downgrade_output()).context("output 3")?,
    ];

    let ledc_timer = LedcTimerDriver::new(
        p.ledc.timer0,
        &TimerConfig::new().frequency(4.kHz().into()),
    )
    .context("LEDC timer")?;
    let buzzer =
        LedcDriver::new(p.ledc.channel0, ledc_timer, p.pins.gpio10).context("LEDC channel")?;

    let mut hw = HardwareAdapter::new(rtc, outputs, buzzer);

    // ── 3. RTC interrupt → alarm bridge ───────────────────────
    // The INT line is open drain and active low; the ISR only marks the
    // pending flag, the main loop does the I2C work.
    let mut rtc_int = PinDriver::input(p.pins.gpio3).context("RTC INT pin")?;
    rtc_int.set_pull(Pull::Up).context("RTC INT pull-up")?;
    rtc_int
        .set_interrupt_type(InterruptType::NegEdge)
        .context("RTC INT edge")?;
    // SAFETY: the callback runs in ISR context and only touches the atomic
    // pending flag — no allocation, no blocking.
    unsafe {
        rtc_int.subscribe(alarm::post).context("RTC INT subscribe")?;
    }
    rtc_int.enable_interrupt().context("RTC INT enable")?;

    // ── 4. Storage, config, event table ───────────────────────
    let mut storage = NvsStorage::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let cfg = config::load(&storage).map_err(|e| anyhow!("config load failed: {e}"))?;
    let store = match EventStore::load(&storage) {
        Ok(store) => store,
        Err(Error::Command(CommandError::NoEventsConfigured)) => {
            info!("no events configured yet");
            EventStore::new()
        }
        Err(e) => {
            warn!("event table load failed ({e}), starting empty");
            EventStore::new()
        }
    };

    // ── 5. Operator console on UART1 ──────────────────────────
    let uart = UartDriver::new(
        p.uart1,
        p.pins.gpio17,
        p.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(115_200)),
    )
    .context("UART init")?;
    let mut console = SerialConsole::start(uart, &LINES);

    // ── 6. Service bring-up and cooperative loop ──────────────
    let mut app = AppService::new(cfg, store);
    if let Err(e) = app.startup(&mut hw) {
        // A dead RTC must not brick the console; the operator can settime.
        warn!("startup incomplete: {e}");
    }
    console.write_line("Waiting for command:");

    loop {
        app.poll(&LINES, &mut hw, &mut storage, &mut console);
        FreeRtos::delay_ms(10);
    }
}
