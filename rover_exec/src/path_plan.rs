//! # Path planner
//!
//! An ordered list of waypoints for a future route-following mode. The list
//! is a building block only: waypoints can be added (from the mission script)
//! and read back, but nothing in the executable computes a route over them
//! yet.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single waypoint. Immutable once added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,

    /// Radius with which the robot should turn through this waypoint.
    ///
    /// Units: meters
    pub turn_radius_m: f64,
}

/// Ordered waypoint store.
pub struct PathPlanner {
    waypoints: Vec<Waypoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathPlanner {
    /// Create the planner, seeded with the origin waypoint.
    pub fn new() -> Self {
        PathPlanner {
            waypoints: vec![Waypoint {
                x_m: 0.0,
                y_m: 0.0,
                turn_radius_m: 0.0,
            }],
        }
    }

    /// Append a waypoint.
    pub fn add_waypoint(&mut self, x_m: f64, y_m: f64, turn_radius_m: f64) {
        debug!(
            "Waypoint added: ({}, {}), turn radius {} m",
            x_m, y_m, turn_radius_m
        );
        self.waypoints.push(Waypoint {
            x_m,
            y_m,
            turn_radius_m,
        });
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_waypoints_keep_insertion_order() {
        let mut planner = PathPlanner::new();

        planner.add_waypoint(1.0, 0.0, 0.25);
        planner.add_waypoint(1.0, 1.0, 0.25);

        let wps = planner.waypoints();
        assert_eq!(wps.len(), 3);
        assert_eq!(wps[0].x_m, 0.0);
        assert_eq!(wps[1], Waypoint { x_m: 1.0, y_m: 0.0, turn_radius_m: 0.25 });
        assert_eq!(wps[2], Waypoint { x_m: 1.0, y_m: 1.0, turn_radius_m: 0.25 });
    }
}
