//! Commands passed into MotionCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A motion command.
///
/// A new command always preempts whatever the controller is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MotionCmd {
    /// Open loop dead reckoned move: drive each wheel the given distance.
    ///
    /// Units: meters
    PointMove { left_m: f64, right_m: f64 },

    /// Closed loop drive towards the given goal pose.
    ///
    /// Units: meters, radians
    Goto {
        x_m: f64,
        y_m: f64,
        heading_rad: f64,
    },

    /// Bring both wheels to an immediate stop and go idle. Deceleration is
    /// never rate limited.
    Stop,
}
