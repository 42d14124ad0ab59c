//! # Mission module
//!
//! The mission layer is the slow supervisory side of the executable: it loads
//! a mission script, and on every supervisory cycle hands out the next
//! command once the motion controller reports idle. It never touches the
//! actuators or encoders itself; everything goes through the motion
//! controller's command/query contract and the safety system's public events.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod script;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use script::*;
