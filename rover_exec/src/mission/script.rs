//! # Mission script interpreter
//!
//! Mission scripts are line oriented: each command is a JSON object
//! terminated by a semicolon, and lines starting with `#` are comments:
//!
//! ```text
//! # Drive a straight leg, then approach the corner
//! {"cmd": "move", "left_m": 1.0, "right_m": 1.0};
//! {"cmd": "goto", "x_m": 1.0, "y_m": 1.0, "heading_rad": 0.0};
//! ```
//!
//! The whole script is parsed up front so that a malformed command is a
//! startup error, not a mid-mission surprise. Execution is sequential: the
//! next command is handed out only when the caller reports the motion
//! controller idle, which makes consecutive moves compose cleanly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use super::cmd::{CmdParseError, MissionCmd};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A mission script interpreter.
///
/// After initialising with the path to the script use
/// [`MissionScript::get_pending_cmd`] once per supervisory cycle.
pub struct MissionScript {
    _script_path: PathBuf,
    cmds: VecDeque<MissionCmd>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid command at entry {0}: {1}")]
    InvalidCmd(usize, CmdParseError),
}

/// Outcome of one supervisory poll of the script.
pub enum PendingCmd {
    /// Nothing to do this cycle (the controller is still busy).
    None,

    /// The next command to execute.
    Some(MissionCmd),

    /// All commands have been issued.
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionScript {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        let cmds = Self::parse(&script)?;

        Ok(MissionScript {
            _script_path: path,
            cmds,
        })
    }

    /// Parse a script's text into the command queue.
    fn parse(script: &str) -> Result<VecDeque<MissionCmd>, ScriptError> {
        let mut cmds = VecDeque::new();

        // Each command is a JSON object up to the terminating semicolon;
        // anything else on a line (comments included) is not matched.
        let re = RegexBuilder::new(r"^\s*(\{[^;]*\})\s*;")
            .multi_line(true)
            .build()
            .unwrap();

        for (i, cap) in re.captures_iter(script).enumerate() {
            match MissionCmd::from_json(cap.get(1).unwrap().as_str()) {
                Ok(c) => cmds.push_back(c),
                Err(e) => return Err(ScriptError::InvalidCmd(i + 1, e)),
            }
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(cmds)
    }

    /// Return the next command if the controller is ready for one.
    ///
    /// Commands are sequential: nothing is handed out while the motion
    /// controller is busy.
    pub fn get_pending_cmd(&mut self, controller_idle: bool) -> PendingCmd {
        if self.cmds.is_empty() {
            return PendingCmd::EndOfScript;
        }

        if !controller_idle {
            return PendingCmd::None;
        }

        match self.cmds.pop_front() {
            Some(cmd) => PendingCmd::Some(cmd),
            None => PendingCmd::EndOfScript,
        }
    }

    /// Get the number of commands left in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }
}
