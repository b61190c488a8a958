//! UART operator console (device target only).
//!
//! The RX half of the UART runs in its own thread — the asynchronous byte
//! delivery context — and does nothing but push received bytes into the
//! shared [`LineAccumulator`]. The TX half stays with the adapter for
//! operator output. Host tests use scripted consoles instead.

use esp_idf_hal::delay::{BLOCK, FreeRtos};
use esp_idf_hal::uart::{UartDriver, UartTxDriver};
use log::warn;

use crate::app::ports::ConsolePort;
use crate::cli::line::LineAccumulator;
use crate::error::Result;

pub struct SerialConsole {
    tx: UartTxDriver<'static>,
    lines: &'static LineAccumulator,
}

impl SerialConsole {
    /// Split the UART and start the RX pump thread.
    pub fn start(uart: UartDriver<'static>, lines: &'static LineAccumulator) -> Self {
        let (tx, rx) = uart.split();

        let spawned = std::thread::Builder::new()
            .name("console-rx".into())
            .stack_size(2048)
            .spawn(move || {
                let mut byte = [0u8; 1];
                loop {
                    match rx.read(&mut byte, BLOCK) {
                        Ok(1) => lines.feed(byte[0]),
                        Ok(_) => {}
                        Err(e) => {
                            warn!("console-rx: UART read failed: {e}");
                            FreeRtos::delay_ms(100);
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("console-rx: thread spawn failed: {e}");
        }

        Self { tx, lines }
    }
}

impl ConsolePort for SerialConsole {
    fn write_line(&mut self, line: &str) {
        let _ = self.tx.write(line.as_bytes());
        let _ = self.tx.write(b"\r\n");
    }

    /// Cooperative blocking line input, used by the `events` follow-up
    /// prompt. The RX thread keeps feeding the accumulator; this just
    /// polls it.
    fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(result) = self.lines.take_line() {
                return result;
            }
            FreeRtos::delay_ms(10);
        }
    }
}
