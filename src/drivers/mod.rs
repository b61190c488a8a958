//! Low-level peripheral drivers.

pub mod ds3232;
