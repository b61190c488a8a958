//! Argument-count boundary sweep over the whole command registry.
//!
//! For every registered command: dispatch with the argument count at both
//! bounds must pass the arity check, and one-below / one-above must fail
//! with `ArgumentCount` carrying the declared bounds.

use crate::mock_hw::{MockHardware, ScriptedConsole};

use outlet_timer::adapters::nvs::NvsStorage;
use outlet_timer::app::service::AppService;
use outlet_timer::cli::registry::COMMANDS;
use outlet_timer::config::SystemConfig;
use outlet_timer::error::{CommandError, Error};
use outlet_timer::scheduler::EventStore;

/// Run `<name> 1 1 ...` with `argc` dummy arguments through a fresh rig.
fn run_with_argc(name: &str, argc: u8) -> Result<(), Error> {
    let mut app = AppService::new(SystemConfig::default(), EventStore::new());
    let mut hw = MockHardware::new();
    let mut storage = NvsStorage::new();
    let mut console = ScriptedConsole::new();

    let mut line = String::from(name);
    for _ in 0..argc {
        line.push_str(" 1");
    }
    app.execute_line(&line, &mut hw, &mut storage, &mut console)
}

fn is_argument_count(result: &Result<(), Error>) -> bool {
    matches!(
        result,
        Err(Error::Command(CommandError::ArgumentCount { .. }))
    )
}

#[test]
fn every_command_accepts_its_bounds_and_rejects_beyond() {
    for c in COMMANDS {
        // At the bounds the arity check passes; the handler may still fail
        // for other reasons (dummy arguments), but never with ArgumentCount.
        let at_min = run_with_argc(c.name, c.min_args);
        assert!(
            !is_argument_count(&at_min),
            "{}: argc == min_args rejected",
            c.name
        );
        let at_max = run_with_argc(c.name, c.max_args);
        assert!(
            !is_argument_count(&at_max),
            "{}: argc == max_args rejected",
            c.name
        );

        // One below (when representable) and one above must fail the check.
        if c.min_args > 0 {
            let below = run_with_argc(c.name, c.min_args - 1);
            assert_eq!(
                below,
                Err(Error::Command(CommandError::ArgumentCount {
                    min: c.min_args,
                    max: c.max_args,
                    given: c.min_args - 1,
                })),
                "{}: argc == min_args - 1 accepted",
                c.name
            );
        }
        let above = run_with_argc(c.name, c.max_args + 1);
        assert_eq!(
            above,
            Err(Error::Command(CommandError::ArgumentCount {
                min: c.min_args,
                max: c.max_args,
                given: c.max_args + 1,
            })),
            "{}: argc == max_args + 1 accepted",
            c.name
        );
    }
}

#[test]
fn unknown_names_never_reach_a_handler() {
    let result = run_with_argc("reboot", 0);
    assert_eq!(result, Err(Error::Command(CommandError::UnknownCommand)));
}
