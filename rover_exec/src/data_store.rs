//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::motion_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a supervisory boundary, on which the
    /// mission script is polled
    pub is_sup_cycle: bool,

    // MotionCtrl
    pub motion_ctrl: motion_ctrl::MotionCtrl,
    pub motion_input: motion_ctrl::InputData,
    pub motion_output: motion_ctrl::OutputData,
    pub motion_report: motion_ctrl::StatusReport,

    // Monitoring counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the supervisory cycle flag.
    pub fn cycle_start(&mut self, sup_period_cycles: u128) {
        self.is_sup_cycle = self.num_cycles % sup_period_cycles == 0;

        self.motion_input = motion_ctrl::InputData::default();
        self.motion_output = motion_ctrl::OutputData::default();
        self.motion_report = motion_ctrl::StatusReport::default();
    }
}
