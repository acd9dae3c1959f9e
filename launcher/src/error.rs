//! Failure taxonomy for the launch pipeline.
//!
//! Every setup failure (config resolution, environment acquisition, job
//! launch) maps to [`crate::exit_codes::SETUP_FAILURE`]. A job that runs
//! and exits non-zero is *not* an error here: its status is forwarded
//! verbatim through [`crate::io::job::JobResult`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    /// User config file does not exist.
    #[error("user config not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// User config is not a well-formed flat YAML mapping.
    #[error("failed to parse user config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// System config referenced by the user config does not exist.
    #[error("system config not found: {path} (referenced from {user_path})")]
    SystemConfigNotFound { path: PathBuf, user_path: PathBuf },

    /// System config is not a well-formed flat YAML mapping.
    #[error("failed to parse system config {path}: {source}")]
    SystemConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A key the job invocation needs is absent or empty after the merge.
    #[error("resolved config is missing required key `{key}` (or its value is empty)")]
    MissingRequiredKey { key: String },

    /// A key is present but its value has an unusable type.
    #[error("invalid value for key `{key}`: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },

    /// The named pinned-dependency environment cannot be activated.
    #[error("environment `{name}` unavailable: {reason}")]
    EnvironmentUnavailable { name: String, reason: String },

    /// The job child process could not be started.
    #[error("failed to launch job: {source}")]
    JobLaunchFailure { source: io::Error },

    /// The job exceeded its configured wall-clock budget and was killed.
    #[error("job timed out after {secs}s")]
    JobTimeout { secs: u64 },

    /// Resolved config could not be serialized for the job handoff.
    #[error("failed to serialize resolved config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// Filesystem plumbing failure outside the taxonomy above.
    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },
}

impl LaunchError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        LaunchError::Io {
            context: context.into(),
            source,
        }
    }
}
