//! Scheduled-event store.
//!
//! The device's long-lived state: a fixed-capacity table of time-of-day
//! events, each pairing an hour/minute and a day-of-week set with the
//! output state to command. The table is persisted as raw 4-byte records
//! at a fixed storage offset; erased storage (`0xFF`) doubles as the
//! "no events configured" sentinel.
//!
//! ```text
//!  storage           memory                    outputs
//! ┌─────────┐ load  ┌───────────────┐ evaluate ┌────────┐
//! │ 5 × 4 B │──────▶│ sorted Vec<5> │─────────▶│ bitmask│
//! │ records │◀──────│ (minute-of-   │          └────────┘
//! └─────────┘ persist│  day order)  │──next_event_after──▶ RTC alarm 2
//!                    └───────────────┘
//! ```
//!
//! Events are aggregate records, kept sorted ascending by minute-of-day;
//! unused slots are never materialised in memory, so they cannot intermix
//! with real entries during ordering.

use core::fmt;

use log::{info, warn};

use crate::app::ports::{AlarmMode, AlarmSlot, ClockPort, DateTime, StoragePort};
use crate::error::{CommandError, Error, Result};

/// Capacity of the persisted event table.
pub const MAX_EVENTS: usize = 5;

/// Bytes per persisted record: hour, minute, day mask, output mask.
pub const EVENT_RECORD_LEN: usize = 4;

/// The event table occupies the start of the storage region.
pub const EVENT_TABLE_OFFSET: usize = 0;

/// Total size of the persisted table.
pub const EVENT_TABLE_LEN: usize = MAX_EVENTS * EVENT_RECORD_LEN;

/// Erased-storage byte; an erased hour field marks an unused slot.
const ERASED: u8 = 0xFF;

// ═══════════════════════════════════════════════════════════════
//  ScheduledEvent
// ═══════════════════════════════════════════════════════════════

/// One schedule entry.
///
/// `day_mask` bit *n* enables the event on weekday *n + 1* (day 1 at the
/// LSB, Sunday by the firmware's convention). `output_mask` is the complete
/// commanded output state: bit *k* high drives output *k* high, so an
/// all-off transition is an event with mask `0x00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub hour: u8,
    pub minute: u8,
    pub day_mask: u8,
    pub output_mask: u8,
}

impl ScheduledEvent {
    /// Hour and minute collapsed to the ascending ordering key.
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Whether the event applies on the given weekday (1–7).
    pub fn active_on(&self, weekday: u8) -> bool {
        weekday >= 1 && weekday <= 7 && self.day_mask & (1 << (weekday - 1)) != 0
    }

    /// Field ranges as the table stores them.
    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60 && self.day_mask <= 0x7F && self.output_mask <= 0x0F
    }

    fn to_record(self) -> [u8; EVENT_RECORD_LEN] {
        [self.hour, self.minute, self.day_mask, self.output_mask]
    }

    /// Decode a persisted record. `None` for unused (erased-hour) slots.
    fn from_record(record: [u8; EVENT_RECORD_LEN]) -> Option<Self> {
        if record[0] == ERASED {
            return None;
        }
        Some(Self {
            hour: record[0],
            minute: record[1],
            day_mask: record[2],
            output_mask: record[3],
        })
    }
}

impl fmt::Display for ScheduledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}, days 0x{:02X}, outputs 0x{:02X}",
            self.hour, self.minute, self.day_mask, self.output_mask
        )
    }
}

// ═══════════════════════════════════════════════════════════════
//  EventStore
// ═══════════════════════════════════════════════════════════════

/// The ordered in-memory event collection plus its persistence round-trips.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventStore {
    events: heapless::Vec<ScheduledEvent, MAX_EVENTS>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the table from persistent storage.
    ///
    /// Fails with [`CommandError::NoEventsConfigured`] when slot 0 carries
    /// the erased sentinel — callers report that and continue with an empty
    /// store. Mid-table erased slots and corrupt records are skipped.
    pub fn load(storage: &dyn StoragePort) -> Result<Self> {
        let mut table = [0u8; EVENT_TABLE_LEN];
        storage.read(EVENT_TABLE_OFFSET, &mut table)?;

        if table[0] == ERASED {
            return Err(CommandError::NoEventsConfigured.into());
        }

        let mut store = Self::new();
        for (slot, record) in table.chunks_exact(EVENT_RECORD_LEN).enumerate() {
            let Some(event) = ScheduledEvent::from_record([
                record[0], record[1], record[2], record[3],
            ]) else {
                continue;
            };
            if !event.is_valid() {
                warn!("event store: slot {slot} corrupt ({record:02X?}), skipping");
                continue;
            }
            // Capacity equals slot count, so this cannot overflow.
            let _ = store.events.push(event);
        }
        store.sort();
        info!("event store: loaded {} event(s)", store.events.len());
        Ok(store)
    }

    /// Insert a new event, re-sort, and persist the whole table.
    /// Fails with [`CommandError::StoreFull`] leaving storage untouched.
    pub fn add(&mut self, event: ScheduledEvent, storage: &mut dyn StoragePort) -> Result<()> {
        if self.events.is_full() {
            return Err(CommandError::StoreFull.into());
        }
        let _ = self.events.push(event);
        self.sort();
        self.persist(storage)
    }

    /// Remove the event at `index` (position in sorted order) and persist.
    /// The caller validates the index.
    pub fn remove(&mut self, index: usize, storage: &mut dyn StoragePort) -> Result<ScheduledEvent> {
        if index >= self.events.len() {
            return Err(CommandError::ArgumentFormat { index: 1 }.into());
        }
        let removed = self.events.remove(index);
        self.persist(storage)?;
        Ok(removed)
    }

    /// Stable ascending sort by minute-of-day. Idempotent; equal keys keep
    /// their insertion order.
    fn sort(&mut self) {
        self.events.sort_by_key(ScheduledEvent::minute_of_day);
    }

    /// Write the full table back: active records first, remaining slots
    /// erased, in one whole-table write.
    pub fn persist(&self, storage: &mut dyn StoragePort) -> Result<()> {
        let mut table = [ERASED; EVENT_TABLE_LEN];
        for (slot, event) in self.events.iter().enumerate() {
            table[slot * EVENT_RECORD_LEN..(slot + 1) * EVENT_RECORD_LEN]
                .copy_from_slice(&event.to_record());
        }
        storage.write(EVENT_TABLE_OFFSET, &table)?;
        Ok(())
    }

    /// Reduce the table to the output state that should be active right now.
    ///
    /// Starting from all outputs off, every event whose weekday bit matches
    /// and whose time is at or before `minute_of_day` is applied in
    /// chronological order; each applicable event commands the complete
    /// output state, so the most recent one wins.
    pub fn evaluate(&self, minute_of_day: u16, weekday: u8) -> u8 {
        let mut mask = 0;
        for event in &self.events {
            if event.active_on(weekday) && event.minute_of_day() <= minute_of_day {
                mask = event.output_mask;
            }
        }
        mask
    }

    /// The next event strictly after the given time, wrapping past midnight
    /// to the earliest entry.
    pub fn next_event_after(&self, minute_of_day: u16) -> Option<&ScheduledEvent> {
        self.events
            .iter()
            .find(|e| e.minute_of_day() > minute_of_day)
            .or_else(|| self.events.first())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alarm arming
// ═══════════════════════════════════════════════════════════════

/// Arm RTC alarm 2 for the next scheduled event, or disarm it when the
/// table is empty.
///
/// The alarm matches hour and minute daily; on weekdays the event does not
/// cover, the wake is spurious but harmless — [`EventStore::evaluate`]
/// filters by day mask and the alarm is re-armed after servicing.
pub fn arm_next_event(
    store: &EventStore,
    now: &DateTime,
    clock: &mut dyn ClockPort,
) -> Result<Option<ScheduledEvent>> {
    let Some(event) = store.next_event_after(now.minute_of_day()) else {
        clock.disable_alarm(AlarmSlot::Two)?;
        info!("scheduler: no events, alarm 2 disarmed");
        return Ok(None);
    };

    let at = DateTime {
        hour: event.hour,
        minute: event.minute,
        second: 0,
        ..*now
    };
    clock.set_alarm(AlarmSlot::Two, AlarmMode::Daily, &at)?;
    clock.enable_alarm(AlarmSlot::Two)?;
    info!(
        "scheduler: alarm 2 armed for next event at {:02}:{:02}",
        event.hour, event.minute
    );
    Ok(Some(*event))
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::nvs::NvsStorage;
    use crate::app::ports::{ClockError, ClockStatus, Temperature};

    fn ev(hour: u8, minute: u8, day_mask: u8, output_mask: u8) -> ScheduledEvent {
        ScheduledEvent {
            hour,
            minute,
            day_mask,
            output_mask,
        }
    }

    /// Storage pre-loaded with the factory example table: everything on at
    /// 06:00, everything off at 20:00, every day.
    fn seeded_storage() -> NvsStorage {
        let mut storage = NvsStorage::new();
        let mut store = EventStore::new();
        store.add(ev(6, 0, 0x7F, 0x0F), &mut storage).unwrap();
        store.add(ev(20, 0, 0x7F, 0x00), &mut storage).unwrap();
        storage
    }

    #[test]
    fn load_on_erased_storage_reports_no_events() {
        let storage = NvsStorage::new();
        let err = EventStore::load(&storage).unwrap_err();
        assert_eq!(err, Error::Command(CommandError::NoEventsConfigured));
    }

    #[test]
    fn erased_slot_zero_wins_even_with_later_garbage() {
        let mut storage = NvsStorage::new();
        // Slot 1 looks like a real record, but slot 0 is erased.
        storage
            .write(EVENT_TABLE_OFFSET + EVENT_RECORD_LEN, &[6, 0, 0x7F, 0x0F])
            .unwrap();
        let err = EventStore::load(&storage).unwrap_err();
        assert_eq!(err, Error::Command(CommandError::NoEventsConfigured));
    }

    #[test]
    fn load_round_trips_and_sorts() {
        let mut storage = NvsStorage::new();
        let mut store = EventStore::new();
        // Inserted out of order on purpose.
        store.add(ev(20, 0, 0x7F, 0x00), &mut storage).unwrap();
        store.add(ev(6, 0, 0x7F, 0x0F), &mut storage).unwrap();

        let loaded = EventStore::load(&storage).unwrap();
        let times: Vec<u16> = loaded.iter().map(ScheduledEvent::minute_of_day).collect();
        assert_eq!(times, vec![360, 1200]);
    }

    #[test]
    fn load_skips_corrupt_records() {
        let mut storage = seeded_storage();
        // Slot 2: hour 25 is out of range.
        storage
            .write(EVENT_TABLE_OFFSET + 2 * EVENT_RECORD_LEN, &[25, 0, 0x7F, 0x0F])
            .unwrap();
        let loaded = EventStore::load(&storage).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn sort_is_idempotent_and_stable() {
        let mut store = EventStore::new();
        // Two events share 08:30; insertion order must survive sorting.
        let _ = store.events.push(ev(8, 30, 0x01, 0x01));
        let _ = store.events.push(ev(7, 0, 0x7F, 0x0F));
        let _ = store.events.push(ev(8, 30, 0x02, 0x02));
        store.sort();

        let first_pass: Vec<ScheduledEvent> = store.iter().copied().collect();
        assert_eq!(first_pass[0].minute_of_day(), 7 * 60);
        assert_eq!(first_pass[1].day_mask, 0x01);
        assert_eq!(first_pass[2].day_mask, 0x02);

        store.sort();
        let second_pass: Vec<ScheduledEvent> = store.iter().copied().collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn add_on_full_store_fails_and_leaves_table_unchanged() {
        let mut storage = NvsStorage::new();
        let mut store = EventStore::new();
        for hour in 0..MAX_EVENTS as u8 {
            store.add(ev(hour, 0, 0x7F, 0x01), &mut storage).unwrap();
        }

        let mut before = [0u8; EVENT_TABLE_LEN];
        storage.read(EVENT_TABLE_OFFSET, &mut before).unwrap();

        let err = store.add(ev(23, 59, 0x7F, 0x0F), &mut storage).unwrap_err();
        assert_eq!(err, Error::Command(CommandError::StoreFull));

        let mut after = [0u8; EVENT_TABLE_LEN];
        storage.read(EVENT_TABLE_OFFSET, &mut after).unwrap();
        assert_eq!(before, after);
        assert_eq!(store.len(), MAX_EVENTS);
    }

    #[test]
    fn persist_writes_active_records_then_erased_slots() {
        let storage = seeded_storage();
        let mut table = [0u8; EVENT_TABLE_LEN];
        storage.read(EVENT_TABLE_OFFSET, &mut table).unwrap();

        assert_eq!(&table[0..4], &[6, 0, 0x7F, 0x0F]);
        assert_eq!(&table[4..8], &[20, 0, 0x7F, 0x00]);
        assert!(table[8..].iter().all(|&b| b == ERASED));
    }

    #[test]
    fn remove_persists_the_shrunk_table() {
        let mut storage = seeded_storage();
        let mut store = EventStore::load(&storage).unwrap();

        let removed = store.remove(0, &mut storage).unwrap();
        assert_eq!(removed.hour, 6);

        let reloaded = EventStore::load(&storage).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.iter().next().unwrap().hour, 20);
    }

    #[test]
    fn remove_out_of_range_is_rejected() {
        let mut storage = seeded_storage();
        let mut store = EventStore::load(&storage).unwrap();
        assert!(store.remove(5, &mut storage).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn evaluate_picks_most_recent_applicable_event() {
        let storage = seeded_storage();
        let store = EventStore::load(&storage).unwrap();

        // 10:00 on weekday 4 (day mask bit 3): the 06:00 all-on event rules.
        assert_eq!(store.evaluate(10 * 60, 4), 0x0F);
        // 21:00: the 20:00 all-off event has superseded it.
        assert_eq!(store.evaluate(21 * 60, 4), 0x00);
        // Before the first event of the day: everything off.
        assert_eq!(store.evaluate(5 * 60, 4), 0x00);
    }

    #[test]
    fn evaluate_filters_by_weekday() {
        let mut store = EventStore::new();
        // Active on day 2 only.
        let _ = store.events.push(ev(6, 0, 0x02, 0x0F));
        assert_eq!(store.evaluate(10 * 60, 2), 0x0F);
        assert_eq!(store.evaluate(10 * 60, 3), 0x00);
    }

    #[test]
    fn next_event_wraps_past_midnight() {
        let storage = seeded_storage();
        let store = EventStore::load(&storage).unwrap();

        assert_eq!(store.next_event_after(5 * 60).unwrap().hour, 6);
        assert_eq!(store.next_event_after(12 * 60).unwrap().hour, 20);
        // After the last event the next one is tomorrow's earliest.
        assert_eq!(store.next_event_after(23 * 60).unwrap().hour, 6);
        // Exact match is not "after".
        assert_eq!(store.next_event_after(6 * 60).unwrap().hour, 20);

        assert!(EventStore::new().next_event_after(0).is_none());
    }

    // ── arm_next_event against a recording clock ──────────────

    #[derive(Default)]
    struct RecordingClock {
        armed: Option<(AlarmSlot, AlarmMode, u8, u8)>,
        enabled: Vec<AlarmSlot>,
        disabled: Vec<AlarmSlot>,
    }

    impl ClockPort for RecordingClock {
        fn get_time(&mut self) -> core::result::Result<DateTime, ClockError> {
            Err(ClockError::Bus)
        }
        fn set_time(&mut self, _t: &DateTime) -> core::result::Result<(), ClockError> {
            Ok(())
        }
        fn set_alarm(
            &mut self,
            slot: AlarmSlot,
            mode: AlarmMode,
            t: &DateTime,
        ) -> core::result::Result<(), ClockError> {
            self.armed = Some((slot, mode, t.hour, t.minute));
            Ok(())
        }
        fn enable_alarm(&mut self, slot: AlarmSlot) -> core::result::Result<(), ClockError> {
            self.enabled.push(slot);
            Ok(())
        }
        fn disable_alarm(&mut self, slot: AlarmSlot) -> core::result::Result<bool, ClockError> {
            self.disabled.push(slot);
            Ok(false)
        }
        fn temperature(&mut self) -> core::result::Result<Temperature, ClockError> {
            Err(ClockError::Bus)
        }
        fn status(&mut self) -> core::result::Result<ClockStatus, ClockError> {
            Err(ClockError::Bus)
        }
    }

    fn noon() -> DateTime {
        DateTime {
            month: 6,
            day: 15,
            year: 24,
            hour: 12,
            minute: 0,
            second: 0,
        }
    }

    #[test]
    fn arm_next_event_programs_alarm_two() {
        let storage = seeded_storage();
        let store = EventStore::load(&storage).unwrap();
        let mut clock = RecordingClock::default();

        let armed = arm_next_event(&store, &noon(), &mut clock).unwrap();
        assert_eq!(armed.unwrap().hour, 20);
        assert_eq!(
            clock.armed,
            Some((AlarmSlot::Two, AlarmMode::Daily, 20, 0))
        );
        assert_eq!(clock.enabled, vec![AlarmSlot::Two]);
    }

    #[test]
    fn arm_next_event_disarms_when_store_empty() {
        let store = EventStore::new();
        let mut clock = RecordingClock::default();

        let armed = arm_next_event(&store, &noon(), &mut clock).unwrap();
        assert!(armed.is_none());
        assert!(clock.armed.is_none());
        assert_eq!(clock.disabled, vec![AlarmSlot::Two]);
    }
}
