//! Application service — the cooperative main-loop logic.
//!
//! [`AppService`] owns the event store and the runtime configuration and
//! exposes one iteration of the device's control flow: service a pending
//! alarm request, then dispatch at most one completed command line. Ports
//! are injected at call sites, so the whole service runs against mock or
//! simulated hardware in tests.
//!
//! ```text
//!  LineAccumulator ─▶ ┌─────────────────────────┐ ─▶ ConsolePort
//!  alarm::take()   ─▶ │        AppService        │ ─▶ OutputPort
//!                     │  EventStore · SystemConfig│ ─▶ ClockPort
//!  StoragePort     ◀─▶└─────────────────────────┘
//! ```

use log::{info, warn};

use crate::alarm;
use crate::app::ports::{
    AlarmSlot, BuzzerPort, ClockPort, ConsolePort, HardwarePorts, OutputPort, StoragePort,
};
use crate::cli::line::LineAccumulator;
use crate::cli::registry::{Console, dispatch};
use crate::cli::tokens::tokenize;
use crate::config::SystemConfig;
use crate::error::{CommandError, Error, Result};
use crate::scheduler::{EventStore, arm_next_event};

/// Orchestrates the interpreter and the scheduler.
pub struct AppService {
    store: EventStore,
    config: SystemConfig,
}

impl AppService {
    /// Construct the service around an already-loaded store and config.
    pub fn new(config: SystemConfig, store: EventStore) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Startup ───────────────────────────────────────────────

    /// One-time bring-up: startup beep, optional output re-sync from the
    /// event table, and arming of the next-event wake alarm.
    pub fn startup(&mut self, hw: &mut impl HardwarePorts) -> Result<()> {
        if self.config.startup_beep_ms > 0 {
            hw.buzz(self.config.startup_beep_ms);
        }

        let now = hw.get_time()?;
        if self.config.sync_outputs_on_boot {
            let mask = self.store.evaluate(now.minute_of_day(), now.weekday());
            hw.apply_mask(mask);
            info!("startup: outputs synced to 0x{mask:02X}");
        }
        arm_next_event(&self.store, &now, hw)?;
        Ok(())
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one iteration of the cooperative loop: service a pending alarm
    /// request, then dispatch at most one completed line.
    ///
    /// Every failure is recovered here — reported to the operator, logged
    /// as an advisory warning — and the loop returns to idle.
    pub fn poll(
        &mut self,
        lines: &LineAccumulator,
        hw: &mut impl HardwarePorts,
        storage: &mut dyn StoragePort,
        out: &mut dyn ConsolePort,
    ) {
        if alarm::take() {
            if let Err(err) = self.service_alarm(hw, out) {
                out.write_line(&format!("error: {err}"));
                warn!("alarm service failed: {err}");
            }
        }

        match lines.take_line() {
            Some(Ok(raw)) => {
                if self.config.echo_input && !raw.trim().is_empty() {
                    out.write_line(&format!("> {raw}"));
                }
                if let Err(err) = self.execute_line(&raw, hw, storage, out) {
                    // Lookup and arity problems were already reported by the
                    // dispatcher, help text included.
                    if !matches!(
                        err,
                        Error::Command(
                            CommandError::UnknownCommand | CommandError::ArgumentCount { .. }
                        )
                    ) {
                        out.write_line(&format!("error: {err}"));
                    }
                    warn!("command failed: {err}");
                }
            }
            Some(Err(err)) => {
                out.write_line("Line too long, input discarded");
                warn!("{err}");
            }
            None => {}
        }
    }

    /// Tokenize and dispatch one raw line.
    ///
    /// After a successful `events` command the table may have changed, so
    /// the next-event wake alarm is re-armed here — arming is the service's
    /// job, not the handler's.
    pub fn execute_line(
        &mut self,
        raw: &str,
        hw: &mut impl HardwarePorts,
        storage: &mut dyn StoragePort,
        out: &mut dyn ConsolePort,
    ) -> Result<()> {
        let cmdline = tokenize(raw);
        if cmdline.name.is_empty() {
            return Ok(());
        }

        let result = {
            let mut console = Console {
                hw: &mut *hw,
                storage: &mut *storage,
                out: &mut *out,
                store: &mut self.store,
                config: &self.config,
            };
            dispatch(&cmdline, &mut console)
        };

        if result.is_ok() && cmdline.name == "events" {
            let now = hw.get_time()?;
            arm_next_event(&self.store, &now, hw)?;
        }
        result
    }

    // ── Alarm servicing ───────────────────────────────────────

    /// Handle a posted alarm request from the cooperative flow.
    ///
    /// Only the comparator that actually fired is disarmed (the line is
    /// level-sensitive, so its flag must be cleared before interrupts can
    /// recur); the operator gets a timestamped notification. When the
    /// next-event alarm was the source, the event table is evaluated, the
    /// outputs are driven to the commanded state, and the alarm is re-armed
    /// for the following event.
    pub fn service_alarm(
        &mut self,
        hw: &mut impl HardwarePorts,
        out: &mut dyn ConsolePort,
    ) -> Result<()> {
        let status = hw.status()?;

        let mut fired_any = false;
        if status.alarm1_fired {
            hw.disable_alarm(AlarmSlot::One)?;
            fired_any = true;
        }
        if status.alarm2_fired {
            hw.disable_alarm(AlarmSlot::Two)?;
            fired_any = true;
        }

        let now = hw.get_time()?;
        if fired_any {
            out.write_line(&format!("Alarm at {now}"));
            info!("alarm serviced at {now}");
        }

        if status.alarm2_fired {
            let mask = self.store.evaluate(now.minute_of_day(), now.weekday());
            hw.apply_mask(mask);
            info!("event fired: outputs set to 0x{mask:02X}");
            arm_next_event(&self.store, &now, hw)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
