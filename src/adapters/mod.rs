//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                        | Connects to                 |
//! |------------|-----------------------------------|-----------------------------|
//! | `hardware` | ClockPort, OutputPort,            | DS3232 over I2C, GPIO, LEDC |
//! |            | BuzzerPort, BusPort               | (in-memory sim on the host) |
//! | `nvs`      | StoragePort                       | NVS blob / 0xFF-filled RAM  |
//! | `serial`   | ConsolePort                       | UART operator console       |

pub mod hardware;
pub mod nvs;

#[cfg(target_os = "espidf")]
pub mod serial;
