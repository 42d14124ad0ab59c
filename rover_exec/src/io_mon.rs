//! # Critical input monitor
//!
//! Samples the fixed set of critical boolean inputs once per safety cycle and
//! evaluates the active state's input rules against the instantaneous
//! samples. There is no debouncing and no edge detection: every cycle is
//! judged independently. The last samples are kept only so that diagnostics
//! can see what the machine saw.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::hal::{Hal, LogicIn};
use crate::safety::{EventId, InputRule};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Monitor over the critical input set.
pub struct IoMonitor {
    inputs: Vec<LogicIn>,
    samples: Vec<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IoMonitor {
    pub fn new(inputs: Vec<LogicIn>) -> Self {
        let samples = vec![false; inputs.len()];
        IoMonitor { inputs, samples }
    }

    /// Sample every critical input.
    pub fn sample(&mut self, hal: &Hal) {
        for (i, input) in self.inputs.iter().enumerate() {
            self.samples[i] = hal.read_logic_in(*input);
        }
    }

    /// The last sampled value of the given input, `None` if the input is not
    /// part of the critical set.
    pub fn value(&self, input: LogicIn) -> Option<bool> {
        self.inputs
            .iter()
            .position(|i| *i == input)
            .map(|i| self.samples[i])
    }

    /// Evaluate a state's input rules against the current samples.
    ///
    /// Rules are evaluated in registration order and the first `Check` whose
    /// sampled value differs from its expected value decides the event; later
    /// rules are not evaluated.
    pub fn evaluate(&self, rules: &[InputRule]) -> Option<EventId> {
        for rule in rules {
            if let InputRule::Check {
                input,
                expected,
                event,
            } = rule
            {
                if let Some(sampled) = self.value(*input) {
                    if sampled != *expected {
                        return Some(*event);
                    }
                }
            }
        }

        None
    }
}
