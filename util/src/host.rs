//! Host environment utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root.
pub const SW_ROOT_ENV_VAR: &str = "ROVER_SW_ROOT";

/// Get the software root directory from the environment.
///
/// The root is the checkout directory containing `params` and `sessions`,
/// and is expected in the `ROVER_SW_ROOT` environment variable.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
