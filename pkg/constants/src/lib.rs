//! Centralized constants for the local-storage operator.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod nodedaemon;
pub mod paths;
pub mod state;
