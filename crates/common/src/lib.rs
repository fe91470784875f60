//! Shared helpers used by every binary in the workspace.

pub mod utils;
