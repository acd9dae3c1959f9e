//! Side-effecting operations: config loading, environments, processes.

pub mod config;
pub mod env;
pub mod job;
pub mod process;
