//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::{
    GoalSeek, MotionCmd, MotionCtrlError, Params, PointMove, Pose, WheelChannel,
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control module state
#[derive(Default)]
pub struct MotionCtrl {
    pub(crate) params: Params,

    /// The wheel channels, `None` until init.
    wheels: Option<(WheelChannel, WheelChannel)>,

    /// The only pose estimate in the system.
    pose: Pose,

    mode: Mode,

    report: StatusReport,
}

/// Input data to motion control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// The motion command to be executed, or `None` if there is no new
    /// command on this cycle.
    pub cmd: Option<MotionCmd>,

    /// Raw tick count of the left wheel encoder.
    pub left_enc_ticks: i64,

    /// Raw tick count of the right wheel encoder.
    pub right_enc_ticks: i64,
}

/// Output command from MotionCtrl that the motor driver must execute.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct OutputData {
    /// Left wheel command (axis rate while goal seeking, fixed drive command
    /// during point moves).
    pub left_cmd: f64,

    /// Right wheel command.
    pub right_cmd: f64,
}

/// Status report for MotionCtrl processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// True while a point move or goal seek is executing.
    pub moving: bool,

    /// True once the current goal has been reached.
    pub goal_reached: bool,

    /// The commanded velocity of the goal seeker, zero otherwise.
    pub velocity_ms: f64,

    /// The current pose estimate.
    pub pose: Pose,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The controller's executing mode.
enum Mode {
    Idle,
    PointMove(PointMove),
    GoalSeek(GoalSeek),
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MotionCtrl {
    type InitData = &'static str;
    type InitError = MotionCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MotionCtrlError;

    /// Initialise the MotionCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(init_data)?;
        self.wheels = Some((
            WheelChannel::new(&self.params.left_wheel),
            WheelChannel::new(&self.params.right_wheel),
        ));

        Ok(())
    }

    /// Perform cyclic processing of motion control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let (left, right) = self
            .wheels
            .as_mut()
            .ok_or(MotionCtrlError::NotInitialised)?;

        // Feed fresh odometry and integrate the pose estimate
        left.update(input_data.left_enc_ticks);
        right.update(input_data.right_enc_ticks);

        let d_left = left.take_step_delta();
        let d_right = right.take_step_delta();
        self.pose
            .integrate_arc(d_left, d_right, self.params.track_width_m);

        // Accept a new command, preempting the current mode
        if let Some(cmd) = input_data.cmd {
            if matches!(self.mode, Mode::PointMove(_) | Mode::GoalSeek(_)) {
                warn!("New motion command preempts the one in progress");
            }
            self.mode = Self::mode_for_cmd(cmd, &self.params)?;
        }

        // Mode processing
        let output = match &mut self.mode {
            Mode::Idle => OutputData::default(),
            Mode::PointMove(mv) => {
                let (left_cmd, right_cmd, complete) =
                    mv.step(left, right, self.params.drive_cmd);

                if complete {
                    // Re-baseline both wheels so the next move composes by
                    // dead reckoning
                    left.step_reference();
                    right.step_reference();
                    info!("Point move complete");
                    self.mode = Mode::Idle;
                }

                OutputData { left_cmd, right_cmd }
            }
            Mode::GoalSeek(gs) => {
                let (left_cmd, right_cmd) = gs.step(&self.pose, &self.params, left, right);
                OutputData { left_cmd, right_cmd }
            }
        };

        self.report = StatusReport {
            moving: self.is_moving(),
            goal_reached: self.goal_reached(),
            velocity_ms: match &self.mode {
                Mode::GoalSeek(gs) if !gs.reached() => gs.last_velocity_ms(),
                _ => 0.0,
            },
            pose: self.pose,
        };

        Ok((output, self.report))
    }
}

impl MotionCtrl {
    /// Build an initialised controller directly from parameters, without a
    /// parameter file. Used by the benchmarks and tests.
    pub fn with_params(params: Params) -> Self {
        let wheels = Some((
            WheelChannel::new(&params.left_wheel),
            WheelChannel::new(&params.right_wheel),
        ));

        MotionCtrl {
            params,
            wheels,
            pose: Pose::default(),
            mode: Mode::Idle,
            report: StatusReport::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// True while a commanded motion is still executing.
    pub fn is_moving(&self) -> bool {
        match &self.mode {
            Mode::Idle => false,
            Mode::PointMove(mv) => mv.is_running(),
            Mode::GoalSeek(gs) => !gs.reached(),
        }
    }

    /// True once the active goal seek has reached its goal.
    pub fn goal_reached(&self) -> bool {
        match &self.mode {
            Mode::GoalSeek(gs) => gs.reached(),
            _ => false,
        }
    }

    /// The current pose estimate.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    fn mode_for_cmd(cmd: MotionCmd, params: &Params) -> Result<Mode, MotionCtrlError> {
        match cmd {
            MotionCmd::PointMove { left_m, right_m } => {
                if !(left_m.is_finite() && right_m.is_finite() && left_m >= 0.0 && right_m >= 0.0)
                {
                    return Err(MotionCtrlError::InvalidMoveTarget(left_m, right_m));
                }
                info!("Starting point move: left {} m, right {} m", left_m, right_m);
                Ok(Mode::PointMove(PointMove::new(left_m, right_m)))
            }
            MotionCmd::Goto {
                x_m,
                y_m,
                heading_rad,
            } => {
                if !(x_m.is_finite() && y_m.is_finite() && heading_rad.is_finite()) {
                    return Err(MotionCtrlError::InvalidGoal(x_m, y_m, heading_rad));
                }
                info!(
                    "Starting goal seek towards ({}, {}, {} rad)",
                    x_m, y_m, heading_rad
                );
                Ok(Mode::GoalSeek(GoalSeek::new(x_m, y_m, heading_rad, params)))
            }
            MotionCmd::Stop => {
                info!("Motion stop commanded");
                Ok(Mode::Idle)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion_ctrl::WheelParams;

    /// Encoder ticks for a forward distance, from the wheel parameters.
    fn ticks_for_distance(params: &WheelParams, distance_m: f64) -> i64 {
        let counts_per_rad = params.encoder_counts_per_rev / std::f64::consts::TAU;
        let sign = if params.mounted_backward { -1.0 } else { 1.0 };
        (distance_m / params.radius_m * params.gear_ratio * counts_per_rad * sign).round() as i64
    }

    #[test]
    fn test_point_move_lifecycle() {
        let params = Params::default();
        let mut ctrl = MotionCtrl::with_params(params.clone());

        // Issue the move
        let mut input = InputData {
            cmd: Some(MotionCmd::PointMove {
                left_m: 1.0,
                right_m: 1.0,
            }),
            ..Default::default()
        };
        let (output, report) = ctrl.proc(&input).unwrap();
        assert_eq!(output.left_cmd, -params.drive_cmd);
        assert_eq!(output.right_cmd, params.drive_cmd);
        assert!(report.moving);
        assert!(ctrl.is_moving());

        // Right wheel done first: its command zeroes independently
        input.cmd = None;
        input.left_enc_ticks = ticks_for_distance(&params.left_wheel, 0.6);
        input.right_enc_ticks = ticks_for_distance(&params.right_wheel, 1.0);
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_eq!(output.left_cmd, -params.drive_cmd);
        assert_eq!(output.right_cmd, 0.0);
        assert!(ctrl.is_moving());

        // Left wheel reaches target: move completes this cycle
        input.left_enc_ticks = ticks_for_distance(&params.left_wheel, 1.0);
        let (output, report) = ctrl.proc(&input).unwrap();
        assert_eq!((output.left_cmd, output.right_cmd), (0.0, 0.0));
        assert!(!report.moving);
        assert!(!ctrl.is_moving());
    }

    #[test]
    fn test_consecutive_moves_compose_by_dead_reckoning() {
        let params = Params::default();
        let mut ctrl = MotionCtrl::with_params(params.clone());

        // Complete a first move
        let mut input = InputData {
            cmd: Some(MotionCmd::PointMove {
                left_m: 0.5,
                right_m: 0.5,
            }),
            ..Default::default()
        };
        ctrl.proc(&input).unwrap();
        input.cmd = None;
        input.left_enc_ticks = ticks_for_distance(&params.left_wheel, 0.5);
        input.right_enc_ticks = ticks_for_distance(&params.right_wheel, 0.5);
        ctrl.proc(&input).unwrap();
        assert!(!ctrl.is_moving());

        // A second move measures from the completion baseline, not from the
        // session origin
        input.cmd = Some(MotionCmd::PointMove {
            left_m: 0.5,
            right_m: 0.5,
        });
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_eq!(output.left_cmd, -params.drive_cmd);
        assert_eq!(output.right_cmd, params.drive_cmd);

        input.cmd = None;
        input.left_enc_ticks = ticks_for_distance(&params.left_wheel, 1.0);
        input.right_enc_ticks = ticks_for_distance(&params.right_wheel, 1.0);
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_eq!((output.left_cmd, output.right_cmd), (0.0, 0.0));
        assert!(!ctrl.is_moving());
    }

    #[test]
    fn test_stop_preempts_goal_seek() {
        let params = Params::default();
        let mut ctrl = MotionCtrl::with_params(params);

        let mut input = InputData {
            cmd: Some(MotionCmd::Goto {
                x_m: 2.0,
                y_m: 0.0,
                heading_rad: 0.0,
            }),
            ..Default::default()
        };
        let (output, _) = ctrl.proc(&input).unwrap();
        assert!(output.left_cmd != 0.0 || output.right_cmd != 0.0);
        assert!(ctrl.is_moving());

        input.cmd = Some(MotionCmd::Stop);
        let (output, report) = ctrl.proc(&input).unwrap();
        assert_eq!((output.left_cmd, output.right_cmd), (0.0, 0.0));
        assert!(!report.moving);
    }

    #[test]
    fn test_invalid_commands_rejected() {
        let params = Params::default();
        let mut ctrl = MotionCtrl::with_params(params);

        let input = InputData {
            cmd: Some(MotionCmd::PointMove {
                left_m: -1.0,
                right_m: 1.0,
            }),
            ..Default::default()
        };
        assert!(matches!(
            ctrl.proc(&input),
            Err(MotionCtrlError::InvalidMoveTarget(_, _))
        ));

        let input = InputData {
            cmd: Some(MotionCmd::Goto {
                x_m: f64::NAN,
                y_m: 0.0,
                heading_rad: 0.0,
            }),
            ..Default::default()
        };
        assert!(matches!(
            ctrl.proc(&input),
            Err(MotionCtrlError::InvalidGoal(_, _, _))
        ));
    }

    #[test]
    fn test_pose_tracks_straight_drive() {
        let params = Params::default();
        let mut ctrl = MotionCtrl::with_params(params.clone());

        let mut input = InputData::default();
        input.left_enc_ticks = ticks_for_distance(&params.left_wheel, 0.4);
        input.right_enc_ticks = ticks_for_distance(&params.right_wheel, 0.4);
        let (_, report) = ctrl.proc(&input).unwrap();

        assert!((report.pose.position_m.x - 0.4).abs() < 1e-3);
        assert!(report.pose.position_m.y.abs() < 1e-6);
        assert!(report.pose.heading_rad.abs() < 1e-6);
    }
}
