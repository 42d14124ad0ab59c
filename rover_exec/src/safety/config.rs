//! This robot's safety state chart
//!
//! Nine operating states in ascending rank order, from the terminal
//! `SystemOff` up to `RobotMoving`. The chart self-advances after the public
//! `start` event: starting up cascades into `SystemOn`, which powers the
//! motors, which starts the robot moving. The `emergency` and `abort` events
//! are registered over ranges of states so that they are reachable from every
//! operating state they apply to, landing in `EmergencyStop` and `Braking`
//! respectively. Walking down from `Braking` cascades through `ShuttingDown`
//! into `SystemOff`, which requests the executor to stop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::machine::{
    EventId, EventVisibility, SafetyBuilder, SafetyConfigError, SafetySystem, StateId,
};
use super::rules::{check, ignore, set};
use crate::hal::{Hal, HalError};
use crate::io_mon::IoMonitor;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The built safety system together with its monitor and the handles the rest
/// of the executable needs.
pub struct RobotSafety {
    pub system: SafetySystem,
    pub io_mon: IoMonitor,
    pub events: RobotEvents,
    pub states: RobotStates,
}

/// Public events of the robot chart.
#[derive(Debug, Clone, Copy)]
pub struct RobotEvents {
    pub start: EventId,
    pub power_on: EventId,
    pub power_off: EventId,
    pub start_moving: EventId,
    pub stop_moving: EventId,
    pub emergency: EventId,
    pub abort: EventId,
}

/// States of the robot chart, rank ascending.
#[derive(Debug, Clone, Copy)]
pub struct RobotStates {
    pub system_off: StateId,
    pub shutting_down: StateId,
    pub braking: StateId,
    pub starting_up: StateId,
    pub emergency_mode: StateId,
    pub emergency_stop: StateId,
    pub system_on: StateId,
    pub motors_on: StateId,
    pub robot_moving: StateId,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors while building the robot chart.
#[derive(Debug, thiserror::Error)]
pub enum RobotSafetyError {
    #[error("HAL channel missing: {0}")]
    HalError(#[from] HalError),

    #[error("Invalid safety configuration: {0}")]
    ConfigError(#[from] SafetyConfigError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the robot's safety system against the given HAL.
pub fn build_robot_safety(hal: &Hal) -> Result<RobotSafety, RobotSafetyError> {
    let mut b = SafetyBuilder::new();

    // Declare the critical outputs
    let led_red = hal.logic_output("led_red")?;
    let led_green = hal.logic_output("led_green")?;
    let led_user0 = hal.logic_output("led_user0")?;
    let led_user1 = hal.logic_output("led_user1")?;

    b.set_critical_outputs(vec![led_red, led_green, led_user0, led_user1]);

    // Declare the critical inputs
    let btn_pause = hal.logic_input("btn_pause")?;
    let btn_mode = hal.logic_input("btn_mode")?;

    b.set_critical_inputs(vec![btn_pause, btn_mode]);

    // Add all states in ascending rank order
    let system_off = b.add_state("System Off");
    let shutting_down = b.add_state("Shutting Down");
    let braking = b.add_state("Braking");
    let starting_up = b.add_state("Starting Up");
    let emergency_mode = b.add_state("Emergency Mode");
    let emergency_stop = b.add_state("Emergency Stop");
    let system_on = b.add_state("System On");
    let motors_on = b.add_state("Motors On");
    let robot_moving = b.add_state("Robot Moving");

    // Events
    let start = b.add_event("start", EventVisibility::Public);
    let shutdown = b.add_event("shutdown", EventVisibility::Private);
    let halt = b.add_event("halt", EventVisibility::Private);
    let reset = b.add_event("reset", EventVisibility::Private);
    let halted = b.add_event("halted", EventVisibility::Private);
    let started = b.add_event("started", EventVisibility::Private);
    let power_on = b.add_event("power_on", EventVisibility::Public);
    let power_off = b.add_event("power_off", EventVisibility::Public);
    let start_moving = b.add_event("start_moving", EventVisibility::Public);
    let stop_moving = b.add_event("stop_moving", EventVisibility::Public);
    let emergency = b.add_event("emergency", EventVisibility::Public);
    let abort = b.add_event("abort", EventVisibility::Public);

    // Per-state transitions
    b.add_transition(system_off, start, starting_up);
    b.add_transition(shutting_down, shutdown, system_off);
    b.add_transition(braking, halt, shutting_down);
    b.add_transition(starting_up, started, system_on);
    b.add_transition(emergency_mode, reset, system_on);
    b.add_transition(emergency_stop, halted, emergency_mode);
    b.add_transition(system_on, power_on, motors_on);
    b.add_transition(motors_on, power_off, system_on);
    b.add_transition(motors_on, start_moving, robot_moving);
    b.add_transition(robot_moving, stop_moving, motors_on);

    // Emergency and abort events over their state ranges
    b.add_range_transition(system_on, robot_moving, emergency, emergency_stop);
    b.add_range_transition(starting_up, robot_moving, abort, braking);

    // Input rules for all states
    b.set_input_rules(system_off, vec![ignore(btn_pause), ignore(btn_mode)]);
    b.set_input_rules(shutting_down, vec![ignore(btn_pause), ignore(btn_mode)]);
    b.set_input_rules(braking, vec![ignore(btn_pause), check(btn_mode, false, reset)]);
    b.set_input_rules(starting_up, vec![ignore(btn_pause), check(btn_mode, false, abort)]);
    b.set_input_rules(
        emergency_mode,
        vec![check(btn_pause, false, reset), check(btn_mode, false, abort)],
    );
    b.set_input_rules(emergency_stop, vec![ignore(btn_pause), ignore(btn_mode)]);
    b.set_input_rules(
        system_on,
        vec![check(btn_pause, false, emergency), check(btn_mode, false, abort)],
    );
    b.set_input_rules(
        motors_on,
        vec![check(btn_pause, false, emergency), check(btn_mode, false, abort)],
    );
    b.set_input_rules(
        robot_moving,
        vec![check(btn_pause, false, emergency), check(btn_mode, false, abort)],
    );

    // Output rules for all states
    b.set_output_rules(system_off, vec![
        set(led_red, false), set(led_green, false), set(led_user0, false), set(led_user1, false),
    ]);
    b.set_output_rules(shutting_down, vec![
        set(led_red, true), set(led_green, false), set(led_user0, false), set(led_user1, false),
    ]);
    b.set_output_rules(braking, vec![
        set(led_red, true), set(led_green, false), set(led_user0, true), set(led_user1, false),
    ]);
    b.set_output_rules(starting_up, vec![
        set(led_red, false), set(led_green, true), set(led_user0, false), set(led_user1, false),
    ]);
    b.set_output_rules(emergency_mode, vec![
        set(led_red, true), set(led_green, false), set(led_user0, false), set(led_user1, false),
    ]);
    b.set_output_rules(emergency_stop, vec![
        set(led_red, true), set(led_green, false), set(led_user0, true), set(led_user1, false),
    ]);
    b.set_output_rules(system_on, vec![
        set(led_red, false), set(led_green, true), set(led_user0, false), set(led_user1, false),
    ]);
    b.set_output_rules(motors_on, vec![
        set(led_red, false), set(led_green, true), set(led_user0, false), set(led_user1, true),
    ]);
    b.set_output_rules(robot_moving, vec![
        set(led_red, false), set(led_green, true), set(led_user0, false), set(led_user1, true),
    ]);

    // State actions, run each cycle the state is active
    b.set_entry_action(system_off, Box::new(|ctx| {
        ctx.stop_requested = true;
    }));
    b.set_entry_action(shutting_down, Box::new(move |ctx| {
        ctx.control_active = false;
        ctx.trigger_event(shutdown);
    }));
    b.set_entry_action(braking, Box::new(move |ctx| {
        ctx.trigger_event(halt);
    }));
    b.set_entry_action(starting_up, Box::new(move |ctx| {
        ctx.control_active = true;
        ctx.trigger_event(started);
    }));
    // Emergency Mode has no automatic action, it is left via the buttons
    b.set_entry_action(emergency_stop, Box::new(move |ctx| {
        ctx.trigger_event(halted);
    }));
    b.set_entry_action(system_on, Box::new(move |ctx| {
        ctx.trigger_event(power_on);
    }));
    b.set_entry_action(motors_on, Box::new(move |ctx| {
        ctx.trigger_event(start_moving);
    }));

    // Entry state
    b.set_entry_state(system_off);

    let system = b.build()?;

    Ok(RobotSafety {
        system,
        io_mon: IoMonitor::new(vec![btn_pause, btn_mode]),
        events: RobotEvents {
            start,
            power_on,
            power_off,
            start_moving,
            stop_moving,
            emergency,
            abort,
        },
        states: RobotStates {
            system_off,
            shutting_down,
            braking,
            starting_up,
            emergency_mode,
            emergency_stop,
            system_on,
            motors_on,
            robot_moving,
        },
    })
}
