//! Integration test entry point.
//!
//! Host-side tests that exercise the full byte-in → dispatch → port-call
//! chain against recording mocks, without real hardware.

mod command_flow_tests;
mod mock_hw;
mod registry_bounds_tests;
