//! Command registry and dispatcher.
//!
//! A fixed, ordered table of command descriptors maps a tokenized line to a
//! handler. Lookup is an exact, case-sensitive match in registration order
//! (names are unique, so first match is unambiguous); the dispatcher
//! validates the argument count against the descriptor's bounds before the
//! handler runs, and reports lookup/arity problems straight to the operator
//! together with the command's help text.

use log::debug;

use crate::app::ports::{ConsolePort, HardwarePorts, StoragePort};
use crate::cli::handlers;
use crate::cli::tokens::CommandLine;
use crate::config::SystemConfig;
use crate::error::{CommandError, Result};
use crate::scheduler::EventStore;

// ───────────────────────────────────────────────────────────────
// Handler context
// ───────────────────────────────────────────────────────────────

/// Everything a command handler may touch, borrowed for one dispatch.
///
/// Handlers receive the device's collaborators through this explicit
/// context instead of reaching for globals; the event store is the
/// long-lived state owned by the application service, lent to the handler
/// for the duration of the call.
pub struct Console<'a> {
    pub hw: &'a mut dyn HardwarePorts,
    pub storage: &'a mut dyn StoragePort,
    pub out: &'a mut dyn ConsolePort,
    pub store: &'a mut EventStore,
    pub config: &'a SystemConfig,
}

/// Command handler signature. The argument slice was already checked
/// against the descriptor's bounds.
pub type Handler = for<'a, 'b> fn(&mut Console<'a>, &[&'b str]) -> Result<()>;

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// One registered command. Static and immutable for the process lifetime.
pub struct CommandDescriptor {
    pub name: &'static str,
    /// Inclusive argument-count bounds; `min_args <= max_args` always.
    pub min_args: u8,
    pub max_args: u8,
    pub handler: Handler,
    pub description: &'static str,
    pub help: &'static str,
}

/// The command catalog, in registration order.
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "led",
        min_args: 1,
        max_args: 2,
        handler: handlers::led,
        description: "Turn LEDs on or off",
        help: "led <state> | led <n> <state>",
    },
    CommandDescriptor {
        name: "gettime",
        min_args: 0,
        max_args: 0,
        handler: handlers::gettime,
        description: "Show the current date and time",
        help: "'gettime' has no parameters",
    },
    CommandDescriptor {
        name: "settime",
        min_args: 6,
        max_args: 6,
        handler: handlers::settime,
        description: "Set the time",
        help: "settime <month> <day> <year> <hr> <min> <sec>",
    },
    CommandDescriptor {
        name: "temp",
        min_args: 0,
        max_args: 0,
        handler: handlers::temp,
        description: "Get the temperature from the RTC",
        help: "'temp' has no parameters",
    },
    CommandDescriptor {
        name: "beep",
        min_args: 1,
        max_args: 1,
        handler: handlers::beep,
        description: "Test the buzzer",
        help: "beep <time (ms)>",
    },
    CommandDescriptor {
        name: "twiscan",
        min_args: 0,
        max_args: 0,
        handler: handlers::twiscan,
        description: "Scan for TWI devices",
        help: "'twiscan' has no parameters",
    },
    CommandDescriptor {
        name: "alarm",
        min_args: 2,
        max_args: 2,
        handler: handlers::alarm,
        description: "Set the alarm",
        help: "alarm <hr> <min>",
    },
    CommandDescriptor {
        name: "rstat",
        min_args: 0,
        max_args: 0,
        handler: handlers::rstat,
        description: "Show the status of the RTC",
        help: "'rstat' has no parameters",
    },
    CommandDescriptor {
        name: "events",
        min_args: 0,
        max_args: 0,
        handler: handlers::events,
        description: "Show and edit the timer events",
        help: "'events' has no parameters",
    },
    CommandDescriptor {
        name: "help",
        min_args: 0,
        max_args: 1,
        handler: handlers::help,
        description: "List commands",
        help: "help [command]",
    },
];

/// Look up a command by exact name.
pub fn find(name: &str) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|c| c.name == name)
}

// ───────────────────────────────────────────────────────────────
// Dispatch
// ───────────────────────────────────────────────────────────────

/// Resolve a tokenized line against the registry and run its handler.
///
/// Lookup and arity failures are reported to the operator here (including
/// the registered help text); handler errors are returned for the caller to
/// surface. An empty line dispatches nothing and succeeds.
pub fn dispatch(line: &CommandLine<'_>, console: &mut Console<'_>) -> Result<()> {
    if line.name.is_empty() {
        return Ok(());
    }

    let Some(desc) = find(line.name) else {
        console
            .out
            .write_line(&format!("Unknown command: {}", line.name));
        return Err(CommandError::UnknownCommand.into());
    };

    let given = line.arg_count;
    if given < desc.min_args || given > desc.max_args {
        let err = CommandError::ArgumentCount {
            min: desc.min_args,
            max: desc.max_args,
            given,
        };
        console.out.write_line(&format!("{}: {}", desc.name, err));
        console.out.write_line(&format!("usage: {}", desc.help));
        return Err(err.into());
    }

    debug!("dispatching '{}' with {} arg(s)", desc.name, given);
    (desc.handler)(console, &line.args)
}
