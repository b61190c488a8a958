//! Full command-flow tests: serial bytes in → port calls out.
//!
//! These drive the real interpreter stack (LineAccumulator → tokenizer →
//! dispatcher → handlers → AppService) against recording mocks and the
//! host storage backend.

use crate::mock_hw::{HwCall, MockHardware, ScriptedConsole};

use outlet_timer::adapters::nvs::NvsStorage;
use outlet_timer::app::ports::{AlarmMode, AlarmSlot, DateTime};
use outlet_timer::app::service::AppService;
use outlet_timer::cli::line::LineAccumulator;
use outlet_timer::config::SystemConfig;
use outlet_timer::scheduler::EventStore;

fn quiet_config() -> SystemConfig {
    SystemConfig {
        echo_input: false,
        startup_beep_ms: 0,
        ..Default::default()
    }
}

fn make_app() -> (AppService, MockHardware, NvsStorage, ScriptedConsole) {
    (
        AppService::new(quiet_config(), EventStore::new()),
        MockHardware::new(),
        NvsStorage::new(),
        ScriptedConsole::new(),
    )
}

/// Feed a full line, terminator included, then run one poll iteration.
fn type_line(
    app: &mut AppService,
    hw: &mut MockHardware,
    storage: &mut NvsStorage,
    console: &mut ScriptedConsole,
    line: &str,
) {
    let lines = LineAccumulator::new();
    for b in line.bytes() {
        lines.feed(b);
    }
    lines.feed(b'\r');
    app.poll(&lines, hw, storage, console);
}

#[test]
fn beep_flows_from_bytes_to_buzzer() {
    let (mut app, mut hw, mut storage, mut console) = make_app();
    type_line(&mut app, &mut hw, &mut storage, &mut console, "beep 500");
    assert_eq!(hw.buzzes(), vec![500]);
}

#[test]
fn settime_flows_to_the_clock_with_exact_fields() {
    let (mut app, mut hw, mut storage, mut console) = make_app();
    type_line(
        &mut app,
        &mut hw,
        &mut storage,
        &mut console,
        "settime 6 15 24 7 30 0",
    );

    assert!(hw.calls.contains(&HwCall::SetTime(DateTime {
        month: 6,
        day: 15,
        year: 24,
        hour: 7,
        minute: 30,
        second: 0,
    })));
    assert!(console.printed("Done"));
}

#[test]
fn alarm_command_arms_and_enables_slot_one() {
    let (mut app, mut hw, mut storage, mut console) = make_app();
    type_line(&mut app, &mut hw, &mut storage, &mut console, "alarm 7 15");

    assert!(hw.calls.contains(&HwCall::SetAlarm {
        slot: AlarmSlot::One,
        mode: AlarmMode::Daily,
        hour: 7,
        minute: 15,
    }));
    assert!(hw.calls.contains(&HwCall::EnableAlarm(AlarmSlot::One)));
}

#[test]
fn clock_failure_is_reported_and_the_loop_stays_responsive() {
    let (mut app, mut hw, mut storage, mut console) = make_app();

    hw.fail_clock = true;
    type_line(&mut app, &mut hw, &mut storage, &mut console, "gettime");
    assert!(console.printed("error: clock: bus transaction failed"));

    // The interpreter returned to idle; the next command still runs.
    hw.fail_clock = false;
    type_line(&mut app, &mut hw, &mut storage, &mut console, "beep 100");
    assert_eq!(hw.buzzes(), vec![100]);
}

#[test]
fn events_lifecycle_add_list_fire() {
    let (mut app, mut hw, mut storage, _) = make_app();

    // Add the factory pair interactively, one `events` invocation each.
    let mut console = ScriptedConsole::with_input(&["add 6 0 0x7F 0x0F"]);
    type_line(&mut app, &mut hw, &mut storage, &mut console, "events");
    assert!(console.printed("Events not found in storage"));
    assert!(console.printed("Event added"));

    let mut console = ScriptedConsole::with_input(&["add 20 0 0x7F 0x00"]);
    type_line(&mut app, &mut hw, &mut storage, &mut console, "events");
    // The 06:00 event is already listed on reload.
    assert!(console.printed("Event 0: 06:00, days 0x7F, outputs 0x0F"));

    // The wake alarm tracks the next event after noon: 20:00.
    assert!(hw.calls.contains(&HwCall::SetAlarm {
        slot: AlarmSlot::Two,
        mode: AlarmMode::Daily,
        hour: 20,
        minute: 0,
    }));

    // 20:00 arrives: the comparator fires and the service applies the
    // all-off event, then re-arms for tomorrow 06:00.
    hw.now = DateTime {
        month: 6,
        day: 15,
        year: 24,
        hour: 20,
        minute: 0,
        second: 0,
    };
    hw.status.alarm2_fired = true;
    let mut console = ScriptedConsole::new();
    app.service_alarm(&mut hw, &mut console).unwrap();

    assert!(console.printed("Alarm at 06/15/2024 20:00:00"));
    assert_eq!(hw.outputs_state(), [false; 4]);
    let last_armed = hw
        .calls
        .iter()
        .rev()
        .find(|c| matches!(c, HwCall::SetAlarm { .. }));
    assert_eq!(
        last_armed,
        Some(&HwCall::SetAlarm {
            slot: AlarmSlot::Two,
            mode: AlarmMode::Daily,
            hour: 6,
            minute: 0,
        })
    );
}

#[test]
fn morning_event_turns_everything_on() {
    let (mut app, mut hw, mut storage, _) = make_app();

    let mut console = ScriptedConsole::with_input(&["add 6 0 0x7F 0x0F"]);
    type_line(&mut app, &mut hw, &mut storage, &mut console, "events");

    hw.now = DateTime {
        month: 6,
        day: 15,
        year: 24,
        hour: 6,
        minute: 0,
        second: 0,
    };
    hw.status.alarm2_fired = true;
    let mut console = ScriptedConsole::new();
    app.service_alarm(&mut hw, &mut console).unwrap();
    assert_eq!(hw.outputs_state(), [true; 4]);
}

#[test]
fn operator_alarm_fires_with_notification_only() {
    let (mut app, mut hw, mut _storage, mut console) = make_app();

    hw.status.alarm1_fired = true;
    app.service_alarm(&mut hw, &mut console).unwrap();

    assert!(console.printed("Alarm at 06/15/2024 12:00:00"));
    assert!(hw.calls.contains(&HwCall::DisableAlarm(AlarmSlot::One)));
    // No events were involved: outputs untouched.
    assert!(
        !hw.calls
            .iter()
            .any(|c| matches!(c, HwCall::SetOutput { .. }))
    );
}

#[test]
fn line_echo_is_configurable() {
    let mut app = AppService::new(
        SystemConfig {
            echo_input: true,
            ..quiet_config()
        },
        EventStore::new(),
    );
    let mut hw = MockHardware::new();
    let mut storage = NvsStorage::new();
    let mut console = ScriptedConsole::new();

    type_line(&mut app, &mut hw, &mut storage, &mut console, "temp");
    assert!(console.printed("> temp"));
    assert!(console.printed("Temp: 21.75 C"));
}

#[test]
fn twiscan_reports_every_responding_address() {
    let (mut app, mut hw, mut storage, mut console) = make_app();
    hw.bus_devices = vec![0x20, 0x68];
    type_line(&mut app, &mut hw, &mut storage, &mut console, "twiscan");
    assert!(console.printed("Found device at 0x20"));
    assert!(console.printed("Found device at 0x68"));
}
