//! Launcher for parameterized processing jobs in pinned environments.
//!
//! One invocation resolves a two-tier configuration (end-user config
//! overlaid on a deployment-fixed system config), acquires the named
//! pinned-dependency environment, runs the opaque processing job inside
//! it, and releases the environment whatever the job's outcome. The
//! architecture separates:
//!
//! - **[`core`]**: Pure, deterministic logic (merging, validation).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, environments,
//!   process execution). Behind traits to enable scripted test doubles.
//!
//! [`launch`] sequences core logic with I/O to implement the CLI.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod launch;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
