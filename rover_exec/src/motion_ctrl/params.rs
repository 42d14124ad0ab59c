//! Parameters structure for MotionCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for motion control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----

    /// Lateral distance between the two driven wheels.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// The left wheel channel.
    pub left_wheel: WheelParams,

    /// The right wheel channel.
    pub right_wheel: WheelParams,

    // ---- POINT MOVES ----

    /// Magnitude of the fixed wheel command issued while a point move is
    /// running. The sign per wheel follows the mount orientation.
    pub drive_cmd: f64,

    // ---- GOAL SEEKING ----

    /// Maximum commanded velocity.
    ///
    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Minimum commanded velocity while driving (the explicit stop at the
    /// goal is the only zero command).
    ///
    /// Units: meters/second
    pub min_velocity_ms: f64,

    /// Gain applied to the bearing error and to the distance before the
    /// threshold comparisons.
    pub k_p_slowdown: f64,

    /// Per-cycle velocity growth factor of the acceleration limiter.
    pub k_p_speedup: f64,

    /// Scaled bearing error above which the turn forces a lower velocity.
    ///
    /// Units: radians
    pub orientation_threshold_rad: f64,

    /// Scaled distance below which the velocity decays linearly.
    ///
    /// Units: meters
    pub decel_threshold_m: f64,

    /// Distance to the goal at which it counts as reached.
    ///
    /// Units: meters
    pub stop_threshold_m: f64,
}

/// Parameters of one wheel channel.
#[derive(Debug, Clone, Deserialize)]
pub struct WheelParams {
    /// Wheel radius.
    ///
    /// Units: meters
    pub radius_m: f64,

    /// True if the wheel is mounted as the mirror image of its partner,
    /// flipping the sign of encoder distances and drive commands.
    pub mounted_backward: bool,

    /// Encoder counts per wheel revolution (both channels).
    pub encoder_counts_per_rev: f64,

    /// Ratio of the gearbox between the motor axis and the wheel.
    pub gear_ratio: f64,

    /// Name of the HAL encoder channel.
    pub encoder: String,

    /// Name of the HAL motor output channel.
    pub motor: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    /// Defaults matching the target robot: 40 mm wheels behind a 3441/104
    /// gearbox with 32-count encoders, the left wheel mirror-mounted.
    fn default() -> Self {
        Params {
            track_width_m: 0.105,
            left_wheel: WheelParams {
                radius_m: 0.04,
                mounted_backward: true,
                encoder_counts_per_rev: 32.0,
                gear_ratio: 3441.0 / 104.0,
                encoder: String::from("enc_left"),
                motor: String::from("motor_left"),
            },
            right_wheel: WheelParams {
                radius_m: 0.04,
                mounted_backward: false,
                encoder_counts_per_rev: 32.0,
                gear_ratio: 3441.0 / 104.0,
                encoder: String::from("enc_right"),
                motor: String::from("motor_right"),
            },
            drive_cmd: 1.5,
            max_velocity_ms: 0.3,
            min_velocity_ms: 0.05,
            k_p_slowdown: 0.8,
            k_p_speedup: 1.2,
            orientation_threshold_rad: 0.4,
            decel_threshold_m: 0.3,
            stop_threshold_m: 0.01,
        }
    }
}
