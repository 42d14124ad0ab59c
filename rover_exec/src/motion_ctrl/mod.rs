//! Motion control module
//!
//! Converts high level motion commands into individual wheel commands using
//! wheel encoder feedback, in two modes:
//!
//! - Point move: open loop, dead reckoned move to a per-wheel distance
//!   target. Each wheel is tracked independently and stops the cycle it
//!   reaches its target; the move is complete once both have.
//! - Goal seek: closed loop drive towards a goal pose, re-estimating the
//!   robot pose from wheel odometry every cycle.
//!
//! The module holds the only pose estimate in the system. It performs no
//! actuation interlocks itself: whether its demands reach the motors is the
//! safety system's decision, applied by the motor driver.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod goal_seek;
mod odometry;
mod params;
mod point_move;
mod pose;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use goal_seek::*;
pub use odometry::*;
pub use params::*;
pub use point_move::*;
pub use pose::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Proc called before the module was initialised")]
    NotInitialised,

    #[error("Point move targets must be finite and non-negative, got ({0}, {1})")]
    InvalidMoveTarget(f64, f64),

    #[error("Goal pose must be finite, got ({0}, {1}, {2})")]
    InvalidGoal(f64, f64, f64),
}
