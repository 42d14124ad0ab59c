//! Open loop point moves
//!
//! A point move drives each wheel a fixed distance, measured against the
//! wheel's per-move odometry reference. The wheels are fully independent:
//! each one's command is zeroed the moment its own travelled distance reaches
//! its target, and the move is complete only once both have. Consecutive
//! moves compose by dead reckoning: the caller re-baselines the references on
//! completion, not at the start of the next move.
//!
//! A wheel that never advances keeps the move running forever, there is no
//! stall timeout.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::WheelChannel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An executing point move.
#[derive(Debug, Clone, Copy)]
pub struct PointMove {
    target_left_m: f64,
    target_right_m: f64,
    left_running: bool,
    right_running: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PointMove {
    pub fn new(target_left_m: f64, target_right_m: f64) -> Self {
        PointMove {
            target_left_m,
            target_right_m,
            left_running: true,
            right_running: true,
        }
    }

    /// Advance the move by one cycle against fresh odometry.
    ///
    /// Returns the two wheel commands and whether the move completed this
    /// cycle.
    pub fn step(
        &mut self,
        left: &WheelChannel,
        right: &WheelChannel,
        drive_cmd: f64,
    ) -> (f64, f64, bool) {
        let mut left_cmd = 0.0;
        let mut right_cmd = 0.0;

        if self.left_running {
            if left.distance_since_reference() >= self.target_left_m {
                self.left_running = false;
                debug!("Left wheel reached its target");
            } else {
                left_cmd = left.drive_command(drive_cmd);
            }
        }

        if self.right_running {
            if right.distance_since_reference() >= self.target_right_m {
                self.right_running = false;
                debug!("Right wheel reached its target");
            } else {
                right_cmd = right.drive_command(drive_cmd);
            }
        }

        (left_cmd, right_cmd, !self.left_running && !self.right_running)
    }

    pub fn is_running(&self) -> bool {
        self.left_running || self.right_running
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion_ctrl::Params;

    /// Encoder ticks for a forward distance, from the wheel parameters.
    fn ticks_for_distance(params: &crate::motion_ctrl::WheelParams, distance_m: f64) -> i64 {
        let counts_per_rad = params.encoder_counts_per_rev / std::f64::consts::TAU;
        let sign = if params.mounted_backward { -1.0 } else { 1.0 };
        (distance_m / params.radius_m * params.gear_ratio * counts_per_rad * sign).round() as i64
    }

    #[test]
    fn test_wheels_complete_independently() {
        let params = Params::default();
        let mut left = WheelChannel::new(&params.left_wheel);
        let mut right = WheelChannel::new(&params.right_wheel);
        let mut mv = PointMove::new(1.0, 1.0);

        // Both wheels short of target: both driven, opposite signs
        left.update(ticks_for_distance(&params.left_wheel, 0.5));
        right.update(ticks_for_distance(&params.right_wheel, 0.5));
        let (l, r, complete) = mv.step(&left, &right, params.drive_cmd);
        assert_eq!(l, -params.drive_cmd);
        assert_eq!(r, params.drive_cmd);
        assert!(!complete);
        assert!(mv.is_running());

        // Right reaches target first: its command is zeroed while the left
        // keeps driving
        left.update(ticks_for_distance(&params.left_wheel, 0.8));
        right.update(ticks_for_distance(&params.right_wheel, 1.0));
        let (l, r, complete) = mv.step(&left, &right, params.drive_cmd);
        assert_eq!(l, -params.drive_cmd);
        assert_eq!(r, 0.0);
        assert!(!complete);

        // Left catches up: complete on the first cycle both are done
        left.update(ticks_for_distance(&params.left_wheel, 1.0));
        let (l, r, complete) = mv.step(&left, &right, params.drive_cmd);
        assert_eq!(l, 0.0);
        assert_eq!(r, 0.0);
        assert!(complete);
        assert!(!mv.is_running());
    }

    #[test]
    fn test_zero_target_completes_wheel_immediately() {
        let params = Params::default();
        let mut left = WheelChannel::new(&params.left_wheel);
        let mut right = WheelChannel::new(&params.right_wheel);

        // A pivot move: the left wheel holds, the right drives
        let mut mv = PointMove::new(0.0, 0.2);

        let (l, r, complete) = mv.step(&left, &right, params.drive_cmd);
        assert_eq!(l, 0.0);
        assert_eq!(r, params.drive_cmd);
        assert!(!complete);

        right.update(ticks_for_distance(&params.right_wheel, 0.2));
        left.update(0);
        let (_, r, complete) = mv.step(&left, &right, params.drive_cmd);
        assert_eq!(r, 0.0);
        assert!(complete);
    }
}
