//! Application core — pure domain logic, zero I/O.
//!
//! The service layer owns the device's long-lived state (event store,
//! runtime config) and drives one iteration of the cooperative loop. All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod ports;
pub mod service;
