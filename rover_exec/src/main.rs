//! Main rover supervisor executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, HAL and all modules
//!     - Build and start the safety system
//!     - Main loop:
//!         - Mission script processing (supervisory cadence)
//!         - Safety system cycle: input sampling, transition, outputs,
//!           state actions
//!         - While the control timedomain is active: encoder sampling,
//!           motion control processing, servo pipeline
//!         - Motor driver execution
//!         - Cycle management
//!
//! The safety system is the only authority over actuation: the motion
//! controller runs and the motor driver passes demands through only while the
//! active safety state keeps the control timedomain running. Teardown walks
//! the state chart down to `System Off` via the public abort event, either
//! from ctrl-c or from the end of the mission script.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use rover_lib::{
    data_store::DataStore,
    hal::Hal,
    mission::{MissionCmd, MissionScript, PendingCmd},
    motion_ctrl::MotionCmd,
    motor_driver::MotorDriver,
    path_plan::PathPlanner,
    safety::{self, RobotSafety},
    servo_ctrl::{ServoCtrl, ServoParams},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info, warn};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one control cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of control cycles between supervisory (mission) polls.
const SUP_PERIOD_CYCLES: u128 = 2;

/// Limit on consecutive cycle overruns before the fault is routed into the
/// safety system.
const MAX_CYCLE_OVERRUN_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rover_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Rover Supervisor Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE HAL ----

    let mut hal = Hal::init("hal.toml").wrap_err("Failed to initialise the HAL")?;
    info!("HAL initialised");

    // ---- INITIALISE MISSION SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the mission script path
    let mut mission = if args.len() == 2 {
        info!("Loading mission script from \"{}\"", &args[1]);

        let script = MissionScript::new(&args[1]).wrap_err("Failed to load mission script")?;

        info!("Loaded script contains {} commands\n", script.get_num_cmds());

        Some(script)
    }
    // If no arguments run in supervision-only mode
    else if args.len() == 1 {
        info!("No mission script provided, supervision only\n");
        None
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    ds.motion_ctrl
        .init("motion_ctrl.toml", &session)
        .wrap_err("Failed to initialise MotionCtrl")?;
    info!("MotionCtrl init complete");

    let motor_driver = MotorDriver::init(
        &hal,
        &ds.motion_ctrl.params().left_wheel.motor,
        &ds.motion_ctrl.params().right_wheel.motor,
    )
    .wrap_err("Failed to initialise the motor driver")?;

    let servo_params: ServoParams =
        util::params::load("servo_ctrl.toml").wrap_err("Could not load servo params")?;
    let servo_ctrl =
        ServoCtrl::init(&hal, &servo_params).wrap_err("Failed to initialise the servo pipeline")?;

    let enc_left = hal
        .encoder(&ds.motion_ctrl.params().left_wheel.encoder)
        .wrap_err("Left encoder channel missing")?;
    let enc_right = hal
        .encoder(&ds.motion_ctrl.params().right_wheel.encoder)
        .wrap_err("Right encoder channel missing")?;

    let mut path_planner = PathPlanner::new();

    info!("Module initialisation complete\n");

    // ---- BUILD SAFETY SYSTEM ----

    let RobotSafety {
        mut system,
        mut io_mon,
        events,
        states: _,
    } = safety::build_robot_safety(&hal).wrap_err("Failed to build the safety system")?;

    info!(
        "Safety system built, entry state: {}",
        system.state_name(system.current_state())
    );

    // ---- ABORT FLAG ----

    // The abort flag replaces in-handler shutdown logic: the handler only
    // sets the flag, the main loop routes it into the safety system.
    let abort_flag = Arc::new(AtomicBool::new(false));
    {
        let flag = abort_flag.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .wrap_err("Failed to set the abort handler")?;
    }

    // ---- START ----

    system
        .trigger_event(events.start)
        .wrap_err("Could not trigger the start event")?;

    info!("Beginning main loop\n");

    let mut abort_sent = false;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(SUP_PERIOD_CYCLES);

        // ---- ABORT HANDLING ----

        if abort_flag.load(Ordering::SeqCst) && !abort_sent {
            warn!("Abort requested, walking the safety system down");
            system
                .trigger_event(events.abort)
                .wrap_err("Could not trigger the abort event")?;
            abort_sent = true;
        }

        // ---- MISSION PROCESSING ----

        if ds.is_sup_cycle && !abort_sent {
            let mut script_finished = false;

            if let Some(ref mut script) = mission {
                match script.get_pending_cmd(!ds.motion_ctrl.is_moving()) {
                    PendingCmd::None => (),
                    PendingCmd::Some(cmd) => match cmd {
                        MissionCmd::Move { left_m, right_m } => {
                            ds.motion_input.cmd = Some(MotionCmd::PointMove { left_m, right_m })
                        }
                        MissionCmd::Goto {
                            x_m,
                            y_m,
                            heading_rad,
                        } => {
                            ds.motion_input.cmd = Some(MotionCmd::Goto {
                                x_m,
                                y_m,
                                heading_rad,
                            })
                        }
                        MissionCmd::Stop => ds.motion_input.cmd = Some(MotionCmd::Stop),
                        MissionCmd::Waypoint {
                            x_m,
                            y_m,
                            turn_radius_m,
                        } => path_planner.add_waypoint(x_m, y_m, turn_radius_m),
                        MissionCmd::Trigger { ref event } => match system.public_event(event) {
                            Some(e) => system
                                .trigger_event(e)
                                .wrap_err("Could not trigger scripted event")?,
                            None => {
                                warn!("Mission script references unknown event {:?}", event)
                            }
                        },
                    },
                    PendingCmd::EndOfScript => {
                        info!("End of mission script reached, stopping");
                        system
                            .trigger_event(events.abort)
                            .wrap_err("Could not trigger the abort event")?;
                        abort_sent = true;
                        script_finished = true;
                    }
                }
            }

            if script_finished {
                mission = None;
            }
        }

        // ---- SAFETY PROCESSING ----

        // A tick error means the state chart itself is unsound, there is no
        // way to continue safely
        if let Err(e) = system.tick(&mut hal, &mut io_mon) {
            raise_error!("Safety system failure: {}", e);
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        if system.control_active() {
            ds.motion_input.left_enc_ticks = hal.encoder_ticks(enc_left);
            ds.motion_input.right_enc_ticks = hal.encoder_ticks(enc_right);

            match ds.motion_ctrl.proc(&ds.motion_input) {
                Ok((output, report)) => {
                    ds.motion_output = output;
                    ds.motion_report = report;
                }
                Err(e) => {
                    // MotionCtrl errors usually just mean a bad command was
                    // sent, so issue the warning and continue
                    warn!("Error during MotionCtrl processing: {}", e)
                }
            }

            servo_ctrl.step(&mut hal);
        }

        motor_driver.apply(&mut hal, &ds.motion_output, system.control_active());

        // Debug: let the encoders follow the applied motor demands
        #[cfg(feature = "sim")]
        {
            let applied = if system.control_active() {
                ds.motion_output
            } else {
                Default::default()
            };
            let params = ds.motion_ctrl.params();
            hal.add_encoder_ticks(
                enc_left,
                sim_encoder_delta(applied.left_cmd, &params.left_wheel),
            );
            hal.add_encoder_ticks(
                enc_right,
                sim_encoder_delta(applied.right_cmd, &params.right_wheel),
            );
        }

        if ds.is_sup_cycle {
            debug!(
                "Pose: ({:.3}, {:.3}, {:.3} rad), moving: {}",
                ds.motion_report.pose.position_m.x,
                ds.motion_report.pose.position_m.y,
                ds.motion_report.pose.heading_rad,
                ds.motion_report.moving
            );
        }

        // ---- CYCLE MANAGEMENT ----

        if system.stop_requested() {
            break;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;

                // Failure to keep the cycle period is routed into the safety
                // system as a fault rather than handled here
                if ds.num_consec_cycle_overruns > MAX_CYCLE_OVERRUN_LIMIT && !abort_sent {
                    error!(
                        "More than {} consecutive cycle overruns, aborting",
                        MAX_CYCLE_OVERRUN_LIMIT
                    );
                    system
                        .trigger_event(events.abort)
                        .wrap_err("Could not trigger the abort event")?;
                    abort_sent = true;
                }
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!(
        "Final state: {}",
        system.state_name(system.current_state())
    );
    session
        .save_json("final_report.json", &ds.motion_report)
        .wrap_err("Could not save the final report")?;

    info!("End of execution");

    Ok(())
}

/// Encoder ticks produced over one cycle by a wheel driven with the given
/// command, treating the command as a motor axis rate.
#[cfg(feature = "sim")]
fn sim_encoder_delta(cmd: f64, wheel: &rover_lib::motion_ctrl::WheelParams) -> i64 {
    let counts_per_rad = wheel.encoder_counts_per_rev / std::f64::consts::TAU;
    (cmd * counts_per_rad * wheel.gear_ratio * CYCLE_PERIOD_S).round() as i64
}
