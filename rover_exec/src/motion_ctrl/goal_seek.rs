//! Closed loop goal seeking
//!
//! Drives the robot towards a goal pose. Every cycle the commanded velocity
//! is the lowest of two caps, clamped into the velocity band:
//!
//! - an angular cap, `MAX / sqrt(|scaled bearing error| + 1)`, so sharp turns
//!   force slower driving;
//! - a distance cap decaying linearly once the scaled distance to the goal
//!   falls below the deceleration threshold.
//!
//! An asymmetric limiter ramps velocity up by at most the speed-up factor per
//! cycle; slowing down is never rate limited, so a stop demand takes effect
//! immediately.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use nalgebra::{Point2, Vector2};

// Internal
use super::{Params, Pose, WheelChannel};
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An executing goal seek.
#[derive(Debug, Clone, Copy)]
pub struct GoalSeek {
    goal_m: Point2<f64>,
    goal_heading_rad: f64,

    /// Velocity commanded on the previous cycle, the reference for the
    /// acceleration limiter.
    last_velocity_ms: f64,

    reached: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoalSeek {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64, params: &Params) -> Self {
        GoalSeek {
            goal_m: Point2::new(x_m, y_m),
            goal_heading_rad: heading_rad,
            last_velocity_ms: params.min_velocity_ms,
            reached: false,
        }
    }

    /// Compute this cycle's wheel commands from the current pose estimate.
    pub fn step(
        &mut self,
        pose: &Pose,
        params: &Params,
        left: &WheelChannel,
        right: &WheelChannel,
    ) -> (f64, f64) {
        // Vector to the goal
        let to_goal: Vector2<f64> = self.goal_m - pose.position_m;
        let distance_m = to_goal.norm();

        if distance_m <= params.stop_threshold_m {
            if !self.reached {
                info!("Goal reached, {:.4} m from target", distance_m);
                self.reached = true;
            }
            return (0.0, 0.0);
        }

        let bearing_rad = to_goal.y.atan2(to_goal.x);
        let scaled_error =
            maths::get_ang_dist_2pi(pose.heading_rad, bearing_rad) * params.k_p_slowdown;

        // Velocity cap from the bearing error: hard turns drive slower
        let mut angular_cap = params.max_velocity_ms;
        if scaled_error.abs() > params.orientation_threshold_rad {
            angular_cap = params.max_velocity_ms / (scaled_error.abs() + 1.0).sqrt();
        }

        // Velocity cap from the remaining distance: decay linearly close in
        let mut distance_cap = params.max_velocity_ms;
        let scaled_distance = distance_m * params.k_p_slowdown;
        if scaled_distance < params.decel_threshold_m {
            distance_cap = params.max_velocity_ms * scaled_distance / params.decel_threshold_m;
        }

        let mut velocity = maths::clamp(
            &angular_cap.min(distance_cap),
            &params.min_velocity_ms,
            &params.max_velocity_ms,
        );

        // Ramp up gently; slowing down is applied unmodified
        if velocity > self.last_velocity_ms {
            velocity = velocity.min(self.last_velocity_ms * params.k_p_speedup);
        }
        self.last_velocity_ms = velocity;

        trace!(
            "Goal seek: dist {:.3} m, bearing err {:.3} rad, velocity {:.3} m/s",
            distance_m,
            scaled_error / params.k_p_slowdown,
            velocity
        );

        (
            left.goal_seek_command(velocity, scaled_error, params.track_width_m),
            right.goal_seek_command(velocity, scaled_error, params.track_width_m),
        )
    }

    pub fn reached(&self) -> bool {
        self.reached
    }

    /// The velocity commanded on the most recent cycle.
    pub fn last_velocity_ms(&self) -> f64 {
        self.last_velocity_ms
    }

    /// The goal heading. Recorded with the goal but not actively controlled:
    /// the approach bearing dominates the final orientation.
    pub fn goal_heading_rad(&self) -> f64 {
        self.goal_heading_rad
    }
}
