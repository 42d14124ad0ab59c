//! Per-wheel odometry
//!
//! Converts raw encoder tick deltas into signed travelled distance, honouring
//! the wheel's mount orientation. Three tick references are tracked per
//! wheel: the per-move baseline (point moves measure progress against it and
//! re-baseline on completion), the session baseline (total distance for
//! diagnostics), and the per-cycle baseline consumed by pose integration.
//! The baselines are independent tick values, never recomputed from each
//! other.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::WheelParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One wheel's encoder channel and geometry.
#[derive(Debug, Clone)]
pub struct WheelChannel {
    radius_m: f64,
    mounted_backward: bool,

    /// Encoder counts per radian of wheel axis rotation.
    counts_per_rad: f64,
    gear_ratio: f64,

    current_ticks: i64,
    move_ref_ticks: i64,
    session_ref_ticks: i64,
    step_ref_ticks: i64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelChannel {
    pub fn new(params: &WheelParams) -> Self {
        WheelChannel {
            radius_m: params.radius_m,
            mounted_backward: params.mounted_backward,
            counts_per_rad: params.encoder_counts_per_rev / std::f64::consts::TAU,
            gear_ratio: params.gear_ratio,
            current_ticks: 0,
            move_ref_ticks: 0,
            session_ref_ticks: 0,
            step_ref_ticks: 0,
        }
    }

    pub fn mounted_backward(&self) -> bool {
        self.mounted_backward
    }

    /// Feed the freshly sampled raw tick count. Call once per cycle before
    /// using any of the distance functions.
    pub fn update(&mut self, ticks: i64) {
        self.current_ticks = ticks;
    }

    /// Capture the current tick count as the new per-move reference.
    pub fn step_reference(&mut self) {
        self.move_ref_ticks = self.current_ticks;
    }

    /// Signed distance travelled since the per-move reference.
    ///
    /// Units: meters
    pub fn distance_since_reference(&self) -> f64 {
        self.distance_from(self.move_ref_ticks)
    }

    /// Signed distance travelled since the start of the session.
    ///
    /// Units: meters
    pub fn total_distance(&self) -> f64 {
        self.distance_from(self.session_ref_ticks)
    }

    /// Signed distance travelled since the last call to this function, which
    /// advances the per-cycle baseline.
    ///
    /// Units: meters
    pub fn take_step_delta(&mut self) -> f64 {
        let delta = self.distance_from(self.step_ref_ticks);
        self.step_ref_ticks = self.current_ticks;
        delta
    }

    /// The wheel command for driving the given velocity and turn rate:
    /// `(2v - s*omega*track) / (2r)` with the mount orientation sign `s`
    /// flipping both the angular term and, like every drive command, the
    /// final sign.
    pub fn goal_seek_command(
        &self,
        velocity_ms: f64,
        turn_rate_rads: f64,
        track_width_m: f64,
    ) -> f64 {
        let s = if self.mounted_backward { 1.0 } else { -1.0 };
        let speed =
            (2.0 * velocity_ms - s * turn_rate_rads * track_width_m) / (2.0 * self.radius_m);
        self.drive_command(speed)
    }

    /// The fixed point-move command, signed per the mount orientation so both
    /// wheels drive the robot forwards.
    pub fn drive_command(&self, magnitude: f64) -> f64 {
        if self.mounted_backward {
            -magnitude
        } else {
            magnitude
        }
    }

    fn distance_from(&self, ref_ticks: i64) -> f64 {
        let tick_delta = (self.current_ticks - ref_ticks) as f64;
        let angle_rad = tick_delta / self.counts_per_rad / self.gear_ratio;
        let sign = if self.mounted_backward { -1.0 } else { 1.0 };
        angle_rad * self.radius_m * sign
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion_ctrl::Params;

    /// Encoder ticks corresponding to the given forward distance on a wheel.
    fn ticks_for_distance(wheel: &WheelChannel, distance_m: f64) -> i64 {
        let sign = if wheel.mounted_backward { -1.0 } else { 1.0 };
        (distance_m / wheel.radius_m * wheel.gear_ratio * wheel.counts_per_rad * sign).round()
            as i64
    }

    #[test]
    fn test_mirrored_mount_negates_distance() {
        let params = Params::default();
        let mut normal = WheelChannel::new(&params.right_wheel);
        let mut mirrored = WheelChannel::new(&params.left_wheel);

        // The same raw tick delta must produce exactly negated distances
        normal.update(5000);
        mirrored.update(5000);

        assert!(normal.distance_since_reference() > 0.0);
        assert_eq!(
            normal.distance_since_reference(),
            -mirrored.distance_since_reference()
        );
        assert_eq!(normal.total_distance(), -mirrored.total_distance());
    }

    #[test]
    fn test_tick_to_distance_conversion() {
        let params = Params::default();
        let mut wheel = WheelChannel::new(&params.right_wheel);

        // One full wheel revolution: counts_per_rev * gear_ratio ticks
        let one_rev_ticks =
            (params.right_wheel.encoder_counts_per_rev * params.right_wheel.gear_ratio).round()
                as i64;
        wheel.update(one_rev_ticks);

        let circumference = std::f64::consts::TAU * params.right_wheel.radius_m;
        assert!((wheel.distance_since_reference() - circumference).abs() < 1e-9);
    }

    #[test]
    fn test_move_and_session_references_are_independent() {
        let params = Params::default();
        let mut wheel = WheelChannel::new(&params.right_wheel);

        wheel.update(ticks_for_distance(&wheel, 1.0));
        assert!((wheel.distance_since_reference() - 1.0).abs() < 1e-3);

        // Re-baselining the move reference must not affect the session total
        wheel.step_reference();
        assert!(wheel.distance_since_reference().abs() < 1e-9);

        wheel.update(ticks_for_distance(&wheel, 1.5));
        assert!((wheel.distance_since_reference() - 0.5).abs() < 1e-3);
        assert!((wheel.total_distance() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_step_delta_advances_its_own_baseline() {
        let params = Params::default();
        let mut wheel = WheelChannel::new(&params.right_wheel);

        wheel.update(ticks_for_distance(&wheel, 0.2));
        assert!((wheel.take_step_delta() - 0.2).abs() < 1e-3);

        // Baseline advanced: no further motion means no further delta
        assert!(wheel.take_step_delta().abs() < 1e-9);

        // The move reference is untouched by step deltas
        assert!((wheel.distance_since_reference() - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_drive_command_signs_oppose() {
        let params = Params::default();
        let left = WheelChannel::new(&params.left_wheel);
        let right = WheelChannel::new(&params.right_wheel);

        assert_eq!(left.drive_command(1.5), -1.5);
        assert_eq!(right.drive_command(1.5), 1.5);
    }

    #[test]
    fn test_goal_seek_commands() {
        let params = Params::default();
        let left = WheelChannel::new(&params.left_wheel);
        let right = WheelChannel::new(&params.right_wheel);

        // Straight drive: same magnitude, opposite signs per the mounts
        let l = left.goal_seek_command(0.1, 0.0, params.track_width_m);
        let r = right.goal_seek_command(0.1, 0.0, params.track_width_m);
        assert_eq!(l, -r);
        assert!(r > 0.0);

        // Positive turn rate speeds the right wheel up and slows the left
        let l_turn = left.goal_seek_command(0.1, 0.5, params.track_width_m);
        let r_turn = right.goal_seek_command(0.1, 0.5, params.track_width_m);
        assert!(l_turn.abs() < l.abs());
        assert!(r_turn > r);
    }
}
