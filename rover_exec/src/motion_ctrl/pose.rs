//! Planar pose estimate
//!
//! The pose lives in a fixed 2D frame and is owned exclusively by the motion
//! controller, which integrates it from the per-cycle wheel distances using
//! the differential drive arc model: unequal wheel distances trace a circular
//! arc around the rotation centre, equal distances degenerate to a straight
//! segment.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Point2;
use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this wheel distance difference the segment is treated as straight,
/// keeping the rotation centre denominator away from zero.
const STRAIGHT_SEGMENT_EPS_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The robot's pose in the fixed odometry frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pose {
    /// Position in the odometry frame.
    ///
    /// Units: meters
    pub position_m: Point2<f64>,

    /// Heading, the angle from the frame's positive X axis. Unbounded: the
    /// consumers wrap it where needed.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Pose {
            position_m: Point2::origin(),
            heading_rad: 0.0,
        }
    }
}

impl Pose {
    /// Integrate one cycle of wheel motion.
    ///
    /// `d_left`/`d_right` are the signed distances each wheel travelled this
    /// cycle.
    pub fn integrate_arc(&mut self, d_left_m: f64, d_right_m: f64, track_width_m: f64) {
        let diff = d_right_m - d_left_m;
        let mean = 0.5 * (d_left_m + d_right_m);
        let heading_delta = diff / track_width_m;

        if diff.abs() < STRAIGHT_SEGMENT_EPS_M {
            // Straight segment
            self.position_m.x += mean * self.heading_rad.cos();
            self.position_m.y += mean * self.heading_rad.sin();
        } else {
            // Arc around the rotation centre, chord taken at half the
            // heading change
            let rotation_radius_m = mean * track_width_m / diff;
            let chord_m = rotation_radius_m * heading_delta;
            let mid_heading = self.heading_rad + 0.5 * heading_delta;
            self.position_m.x += chord_m * mid_heading.cos();
            self.position_m.y += chord_m * mid_heading.sin();
        }

        self.heading_rad += heading_delta;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TRACK_M: f64 = 0.105;

    #[test]
    fn test_straight_segment() {
        let mut pose = Pose::default();
        pose.heading_rad = std::f64::consts::FRAC_PI_2;

        pose.integrate_arc(0.5, 0.5, TRACK_M);

        assert!(pose.position_m.x.abs() < 1e-12);
        assert!((pose.position_m.y - 0.5).abs() < 1e-12);
        assert!((pose.heading_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_turn_on_the_spot() {
        let mut pose = Pose::default();

        // Mirror-symmetric wheel motion rotates without translating
        pose.integrate_arc(-0.1, 0.1, TRACK_M);

        assert!(pose.position_m.coords.norm() < 1e-12);
        assert!((pose.heading_rad - 0.2 / TRACK_M).abs() < 1e-12);
    }

    #[test]
    fn test_arc_heading_matches_wheel_difference() {
        let mut pose = Pose::default();

        pose.integrate_arc(0.08, 0.12, TRACK_M);

        // Heading change is the wheel distance difference over the track
        assert!((pose.heading_rad - 0.04 / TRACK_M).abs() < 1e-12);

        // The chord length equals the mean wheel distance
        assert!((pose.position_m.coords.norm() - 0.1).abs() < 1e-9);
    }
}
