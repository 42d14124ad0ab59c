//! # Motor driver
//!
//! Applies the motion controller's wheel demands to the HAL motor outputs.
//! The driver is the single writer of the motor channels and the place where
//! the safety system's actuation gate takes effect: while the control
//! timedomain is stopped every demand is replaced by zero, so no stale
//! command can reach the motors.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use crate::hal::{AnalogOut, Hal, HalError};
use crate::motion_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Driver over the two motor output channels.
pub struct MotorDriver {
    left_motor: AnalogOut,
    right_motor: AnalogOut,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorDriver {
    /// Resolve the motor output channels.
    pub fn init(hal: &Hal, left_name: &str, right_name: &str) -> Result<Self, HalError> {
        Ok(MotorDriver {
            left_motor: hal.analog_output(left_name)?,
            right_motor: hal.analog_output(right_name)?,
        })
    }

    /// Write this cycle's demands, zeroed while actuation is disabled.
    pub fn apply(&self, hal: &mut Hal, demands: &motion_ctrl::OutputData, enabled: bool) {
        let (left_cmd, right_cmd) = if enabled {
            (demands.left_cmd, demands.right_cmd)
        } else {
            (0.0, 0.0)
        };

        hal.write_analog_out(self.left_motor, left_cmd);
        hal.write_analog_out(self.right_motor, right_cmd);

        trace!("Motor demands: left {:.3}, right {:.3}", left_cmd, right_cmd);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::HalParams;

    fn motor_hal() -> Hal {
        Hal::from_params(HalParams {
            logic_inputs: vec![],
            logic_outputs: vec![],
            encoders: vec![],
            analog_inputs: vec![],
            analog_outputs: vec!["motor_left".into(), "motor_right".into()],
        })
    }

    #[test]
    fn test_demands_gated_by_enable() {
        let mut hal = motor_hal();
        let driver = MotorDriver::init(&hal, "motor_left", "motor_right").unwrap();
        let left = hal.analog_output("motor_left").unwrap();
        let right = hal.analog_output("motor_right").unwrap();

        let demands = motion_ctrl::OutputData {
            left_cmd: -1.5,
            right_cmd: 1.5,
        };

        driver.apply(&mut hal, &demands, true);
        assert_eq!(hal.analog_out_value(left), -1.5);
        assert_eq!(hal.analog_out_value(right), 1.5);

        // Disabled: demands are replaced by zero, not held
        driver.apply(&mut hal, &demands, false);
        assert_eq!(hal.analog_out_value(left), 0.0);
        assert_eq!(hal.analog_out_value(right), 0.0);
    }
}
