//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod batch;
pub mod evaluate;
pub mod init;
pub mod recommend;
