//! # Servo stabilisation pipeline
//!
//! Keeps the body-mounted servos aligned against the measured attitude. The
//! signal topology is fixed and small, so it is expressed as an explicit
//! ordered pipeline of pure functions run once per cycle: read the attitude
//! quaternion's half-angle component for the axis, scale it into the servo
//! command range, clamp, write.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::hal::{AnalogIn, AnalogOut, Hal, HalError};
use util::maths;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Servo command range limit.
///
/// Units: radians
pub const SERVO_RANGE_RAD: f64 = 1.5;

/// Scale between the quaternion half-angle component and the servo command:
/// the usable half-angle band of 0.9 rad maps onto the full servo range.
const SERVO_SCALE: f64 = 0.9 / SERVO_RANGE_RAD;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Channel names of one stabilised axis.
#[derive(Debug, Deserialize)]
pub struct ServoAxisParams {
    /// Quaternion component input channel.
    pub input: String,

    /// Servo output channel.
    pub output: String,
}

/// Parameters for the servo pipeline.
#[derive(Debug, Default, Deserialize)]
pub struct ServoParams {
    pub axes: Vec<ServoAxisParams>,
}

/// The resolved servo pipeline.
pub struct ServoCtrl {
    axes: Vec<(AnalogIn, AnalogOut)>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a quaternion half-angle component into a servo command.
pub fn quat_to_servo_angle(half_angle_component: f64) -> f64 {
    maths::clamp(
        &(half_angle_component / SERVO_SCALE),
        &-SERVO_RANGE_RAD,
        &SERVO_RANGE_RAD,
    )
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ServoCtrl {
    /// Resolve all axis channels.
    pub fn init(hal: &Hal, params: &ServoParams) -> Result<Self, HalError> {
        let mut axes = Vec::with_capacity(params.axes.len());

        for axis in &params.axes {
            axes.push((
                hal.analog_input(&axis.input)?,
                hal.analog_output(&axis.output)?,
            ));
        }

        Ok(ServoCtrl { axes })
    }

    /// Run the pipeline once.
    pub fn step(&self, hal: &mut Hal) {
        for (input, output) in &self.axes {
            let angle = quat_to_servo_angle(hal.read_analog_in(*input));
            hal.write_analog_out(*output, angle);
        }
    }
}
