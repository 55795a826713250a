//! Library half of the `vitehead` binary.
//!
//! Exposed so integration tests can drive the commands and the HTTP router
//! without spawning a process.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod server;
pub mod ui;
