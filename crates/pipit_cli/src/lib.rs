//! Library half of the `pipit` binary, split out so the CLI's file
//! discovery and config loading can be exercised by integration tests
//! without spawning a subprocess.

pub mod args;
pub mod config;
pub mod logging;
pub mod run;
