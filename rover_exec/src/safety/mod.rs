//! # Safety system module
//!
//! The safety system is the topmost authority over whether anything on the
//! robot may move. It is an event-driven state machine over a flat, ranked
//! set of operating states; per state it carries the critical input rules,
//! the critical output values and an action, and it gates the control
//! timedomain through the flags on its context.
//!
//! `machine` holds the generic machine and its builder, `rules` the input and
//! output rule types, and `config` this robot's concrete state chart.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod config;
mod machine;
mod rules;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use config::*;
pub use machine::*;
pub use rules::*;
