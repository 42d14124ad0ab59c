//! Mission commands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command issued by the mission script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MissionCmd {
    /// Open loop point move, per-wheel distances in meters.
    Move { left_m: f64, right_m: f64 },

    /// Closed loop drive to a goal pose.
    Goto {
        x_m: f64,
        y_m: f64,
        heading_rad: f64,
    },

    /// Stop the motion controller.
    Stop,

    /// Append a waypoint to the path planner.
    Waypoint {
        x_m: f64,
        y_m: f64,
        turn_radius_m: f64,
    },

    /// Trigger a public safety event by name.
    Trigger { event: String },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum CmdParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionCmd {
    /// Parse a command from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, CmdParseError> {
        Ok(serde_json::from_str(json_str)?)
    }
}
