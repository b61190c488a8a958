//! Alarm bridge: RTC interrupt line → main loop.
//!
//! The RTC's interrupt pin is level-sensitive and serviced over I2C, which
//! must not happen in interrupt context. The ISR therefore does exactly one
//! thing — set this pending flag — and the cooperative main loop performs
//! the disarm/notify/evaluate sequence on its next iteration
//! (see [`AppService::service_alarm`](crate::app::service::AppService::service_alarm)).
//!
//! ```text
//! ┌──────────────┐  post()   ┌──────────────┐  take()   ┌───────────┐
//! │ RTC INT ISR  │──────────▶│ AtomicBool   │──────────▶│ Main Loop │
//! └──────────────┘ (lock-free)└──────────────┘ (consume) └───────────┘
//! ```
//!
//! The flag is intentionally a static: ISR callbacks cannot carry state,
//! and a single bit is all the two contexts share.

use core::sync::atomic::{AtomicBool, Ordering};

static ALARM_PENDING: AtomicBool = AtomicBool::new(false);

/// Mark an alarm request. Safe to call from ISR context: lock-free,
/// non-blocking, no allocation. Multiple posts before the next service
/// collapse into one.
pub fn post() {
    ALARM_PENDING.store(true, Ordering::Release);
}

/// Consume the pending request, if any. Called from the main loop only;
/// clears the flag atomically so one post is serviced exactly once.
pub fn take() -> bool {
    ALARM_PENDING.swap(false, Ordering::AcqRel)
}
