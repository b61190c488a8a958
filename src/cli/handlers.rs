//! Command handlers.
//!
//! One function per registry entry. Handlers get their collaborators
//! through the [`Console`] context and report results as operator-visible
//! text; argument conversion failures carry the 1-based position of the
//! offending token.

use log::info;

use crate::app::ports::{
    AlarmMode, AlarmSlot, BusPort, BuzzerPort, ClockPort, ConsolePort, DateTime, OutputPort,
};
use crate::cli::registry::{COMMANDS, Console, find};
use crate::cli::tokens::{CommandLine, int_arg, mask_arg, tokenize};
use crate::error::{CommandError, Error, Result};
use crate::scheduler::{EventStore, MAX_EVENTS, ScheduledEvent};

/// `led <state>` drives LEDs 1–3 uniformly; `led <n> <state>` one of them.
/// Output 0 is the relay channel and is only driven by events.
pub fn led(console: &mut Console<'_>, args: &[&str]) -> Result<()> {
    if args.len() == 1 {
        let on = int_arg::<u8>(args, 1)? != 0;
        for id in 1..=3 {
            console.hw.set_output(id, on);
        }
    } else {
        let id: u8 = int_arg(args, 1)?;
        if !(1..=3).contains(&id) {
            return Err(CommandError::ArgumentFormat { index: 1 }.into());
        }
        let on = int_arg::<u8>(args, 2)? != 0;
        console.hw.set_output(id, on);
    }
    Ok(())
}

/// `gettime` — read and report the RTC.
pub fn gettime(console: &mut Console<'_>, _args: &[&str]) -> Result<()> {
    let now = console.hw.get_time()?;
    console.out.write_line(&now.to_string());
    Ok(())
}

/// `settime <month> <day> <year> <hr> <min> <sec>`.
pub fn settime(console: &mut Console<'_>, args: &[&str]) -> Result<()> {
    let t = DateTime {
        month: int_arg(args, 1)?,
        day: int_arg(args, 2)?,
        year: int_arg(args, 3)?,
        hour: int_arg(args, 4)?,
        minute: int_arg(args, 5)?,
        second: int_arg(args, 6)?,
    };
    if let Err(crate::error::ClockError::InvalidField(field)) = t.validate() {
        let index = match field {
            "month" => 1,
            "day" => 2,
            "year" => 3,
            "hour" => 4,
            "minute" => 5,
            _ => 6,
        };
        return Err(CommandError::ArgumentFormat { index }.into());
    }
    console.hw.set_time(&t)?;
    console.out.write_line("Done");
    info!("time set to {t}");
    Ok(())
}

/// `temp` — RTC die temperature in 0.25 °C steps.
pub fn temp(console: &mut Console<'_>, _args: &[&str]) -> Result<()> {
    let t = console.hw.temperature()?;
    console.out.write_line(&format!("Temp: {t} C"));
    Ok(())
}

/// `beep <ms>` — sound the buzzer. Durations above the configured ceiling
/// are clamped.
pub fn beep(console: &mut Console<'_>, args: &[&str]) -> Result<()> {
    let requested: u16 = int_arg(args, 1)?;
    let duration = requested.min(console.config.max_beep_ms);
    console.hw.buzz(duration);
    Ok(())
}

/// `twiscan` — enumerate responding bus addresses.
pub fn twiscan(console: &mut Console<'_>, _args: &[&str]) -> Result<()> {
    let found = console.hw.scan();
    if found.is_empty() {
        console.out.write_line("No devices found");
    } else {
        for addr in &found {
            console.out.write_line(&format!("Found device at 0x{addr:02X}"));
        }
    }
    Ok(())
}

/// `alarm <hr> <min>` — arm RTC alarm 1 to fire daily at the given time.
pub fn alarm(console: &mut Console<'_>, args: &[&str]) -> Result<()> {
    let hour: u8 = int_arg(args, 1)?;
    if hour > 23 {
        return Err(CommandError::ArgumentFormat { index: 1 }.into());
    }
    let minute: u8 = int_arg(args, 2)?;
    if minute > 59 {
        return Err(CommandError::ArgumentFormat { index: 2 }.into());
    }

    // The comparator only looks at the time fields; the date comes along
    // for the ride from the current timestamp.
    let now = console.hw.get_time()?;
    let at = DateTime {
        hour,
        minute,
        second: 0,
        ..now
    };
    console.hw.set_alarm(AlarmSlot::One, AlarmMode::Daily, &at)?;
    console.hw.enable_alarm(AlarmSlot::One)?;
    console
        .out
        .write_line(&format!("Alarm set for {hour:02}:{minute:02}"));
    Ok(())
}

/// `rstat` — decode and print the RTC control/status registers.
pub fn rstat(console: &mut Console<'_>, _args: &[&str]) -> Result<()> {
    let s = console.hw.status()?;
    let flag = |b: bool| if b { "set" } else { "clear" };
    console
        .out
        .write_line(&format!("Oscillator stop flag: {}", flag(s.oscillator_stopped)));
    console
        .out
        .write_line(&format!("32kHz output: {}", if s.output_32khz { "on" } else { "off" }));
    console
        .out
        .write_line(&format!("Temperature conversion busy: {}", flag(s.busy)));
    console.out.write_line(&format!(
        "Alarm 1: {}, flag {}",
        if s.alarm1_enabled { "enabled" } else { "disabled" },
        flag(s.alarm1_fired)
    ));
    console.out.write_line(&format!(
        "Alarm 2: {}, flag {}",
        if s.alarm2_enabled { "enabled" } else { "disabled" },
        flag(s.alarm2_fired)
    ));
    Ok(())
}

/// `events` — reload and list the event table, then accept one follow-up
/// sub-command from the console: `add <hr> <min> <dayMask> <outMask>` or
/// `del <n>`. An empty follow-up line leaves the table unchanged.
pub fn events(console: &mut Console<'_>, _args: &[&str]) -> Result<()> {
    match EventStore::load(console.storage) {
        Ok(loaded) => *console.store = loaded,
        Err(Error::Command(CommandError::NoEventsConfigured)) => {
            console.out.write_line("Events not found in storage");
            *console.store = EventStore::new();
        }
        Err(e) => return Err(e),
    }

    for (i, event) in console.store.iter().enumerate() {
        console.out.write_line(&format!("Event {i}: {event}"));
    }
    console.out.write_line(&format!(
        "{} of {MAX_EVENTS} slots used. Enter a command (add <hr> <min> <dayMask> <outMask> | del <n>):",
        console.store.len()
    ));

    let line = console.out.read_line()?;
    let sub = tokenize(&line);
    match sub.name {
        "" => Ok(()),
        "add" => add_event(console, &sub),
        "del" => del_event(console, &sub),
        other => {
            console.out.write_line(&format!("Unknown command: {other}"));
            Err(CommandError::UnknownCommand.into())
        }
    }
}

fn add_event(console: &mut Console<'_>, sub: &CommandLine<'_>) -> Result<()> {
    if sub.arg_count != 4 {
        let err = CommandError::ArgumentCount {
            min: 4,
            max: 4,
            given: sub.arg_count,
        };
        console.out.write_line(&format!("add: {err}"));
        return Err(err.into());
    }

    let event = ScheduledEvent {
        hour: int_arg(&sub.args, 1)?,
        minute: int_arg(&sub.args, 2)?,
        day_mask: mask_arg(&sub.args, 3)?,
        output_mask: mask_arg(&sub.args, 4)?,
    };
    if !event.is_valid() {
        let index = if event.hour > 23 {
            1
        } else if event.minute > 59 {
            2
        } else if event.day_mask > 0x7F {
            3
        } else {
            4
        };
        return Err(CommandError::ArgumentFormat { index }.into());
    }

    console.store.add(event, console.storage)?;
    console.out.write_line(&format!("Event added: {event}"));
    info!("event added: {event}");
    Ok(())
}

fn del_event(console: &mut Console<'_>, sub: &CommandLine<'_>) -> Result<()> {
    if sub.arg_count != 1 {
        let err = CommandError::ArgumentCount {
            min: 1,
            max: 1,
            given: sub.arg_count,
        };
        console.out.write_line(&format!("del: {err}"));
        return Err(err.into());
    }

    let index: usize = int_arg(&sub.args, 1)?;
    if index >= console.store.len() {
        console.out.write_line(&format!("No event {index}"));
        return Err(CommandError::ArgumentFormat { index: 1 }.into());
    }
    let removed = console.store.remove(index, console.storage)?;
    console.out.write_line(&format!("Removed event {index}: {removed}"));
    info!("event removed: {removed}");
    Ok(())
}

/// `help` / `help <command>`.
pub fn help(console: &mut Console<'_>, args: &[&str]) -> Result<()> {
    match args.first() {
        None => {
            for c in COMMANDS {
                console
                    .out
                    .write_line(&format!("{:<8} - {}", c.name, c.description));
            }
            Ok(())
        }
        Some(name) => match find(name) {
            Some(c) => {
                console.out.write_line(&format!("{} - {}", c.name, c.description));
                console.out.write_line(&format!("usage: {}", c.help));
                Ok(())
            }
            None => {
                console.out.write_line(&format!("Unknown command: {name}"));
                Err(CommandError::UnknownCommand.into())
            }
        },
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
