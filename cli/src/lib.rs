//! Library half of the `graph-walk` binary: configuration, graph loading and
//! the subcommand implementations, kept here so they can be tested without
//! spawning a process.

pub mod commands;
pub mod config;
pub mod load;
