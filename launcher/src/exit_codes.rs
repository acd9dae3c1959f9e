//! Stable exit codes for the launcher CLI.

/// Job ran and reported success.
pub const OK: i32 = 0;

/// Launcher setup failed: config resolution, environment acquisition, or
/// the job child process could not start. Chosen well above the exit
/// codes processing jobs conventionally use, so callers can distinguish
/// "launcher setup failed" from "job ran and failed". A job's own
/// non-zero status is forwarded verbatim instead of this code.
pub const SETUP_FAILURE: i32 = 125;
