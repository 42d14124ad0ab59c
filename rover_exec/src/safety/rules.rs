//! Per-state critical I/O rules
//!
//! Each safety state declares what to do with every critical input (check it
//! against an expected value, or sample-and-ignore it) and what value to set
//! on every critical output. States must cover the full critical I/O set;
//! partial coverage is rejected when the safety system is built.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::machine::EventId;
use crate::hal::{LogicIn, LogicOut};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rule applied to one critical input while a state is active.
#[derive(Debug, Clone, Copy)]
pub enum InputRule {
    /// Trigger `event` on any cycle where the sampled input differs from
    /// `expected`.
    Check {
        input: LogicIn,
        expected: bool,
        event: EventId,
    },

    /// Sample the input for diagnostics but never trigger a transition.
    Ignore { input: LogicIn },
}

/// A value applied to one critical output on every cycle a state is active.
#[derive(Debug, Clone, Copy)]
pub struct OutputRule {
    pub output: LogicOut,
    pub value: bool,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a checking input rule.
pub fn check(input: LogicIn, expected: bool, event: EventId) -> InputRule {
    InputRule::Check {
        input,
        expected,
        event,
    }
}

/// Build an ignoring input rule.
pub fn ignore(input: LogicIn) -> InputRule {
    InputRule::Ignore { input }
}

/// Build an output rule.
pub fn set(output: LogicOut, value: bool) -> OutputRule {
    OutputRule { output, value }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InputRule {
    /// The input this rule samples.
    pub fn input(&self) -> LogicIn {
        match self {
            InputRule::Check { input, .. } => *input,
            InputRule::Ignore { input } => *input,
        }
    }
}
