//! Invocation of the opaque processing job.
//!
//! The invoker serializes the resolved configuration into the handle's
//! scratch directory and hands that single file path to the job. It
//! blocks until the child terminates and forwards the exit status
//! verbatim; artifacts the job writes are its own concern.

use std::fs;
use std::process::Command;

use tracing::{debug, info, instrument, warn};

use crate::core::resolved::ResolvedConfig;
use crate::error::LaunchError;
use crate::io::env::EnvHandle;
use crate::io::process::run_command;

/// Bound on captured job stdout/stderr.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// File name of the serialized resolved config inside the scratch dir.
pub const RESOLVED_CONFIG_FILE: &str = "resolved_config.yaml";

/// Exit status and error text surfaced by the job process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Child termination status, forwarded verbatim. `-1` when the
    /// child was killed by a signal and reported no code.
    pub exit_code: i32,
    /// Tail of the child's stderr, for diagnostics on failure.
    pub error_text: String,
}

impl JobResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Abstraction over job execution backends. Tests use scripted runners
/// that return predetermined results without spawning processes.
pub trait JobRunner {
    /// Launch the job scoped to `handle` and wait for it to terminate.
    fn invoke(&self, resolved: &ResolvedConfig, handle: &EnvHandle)
    -> Result<JobResult, LaunchError>;
}

/// Runner that spawns the job through `conda run` inside the acquired
/// environment prefix.
pub struct CondaJobRunner {
    conda_bin: std::ffi::OsString,
    output_limit_bytes: usize,
}

impl Default for CondaJobRunner {
    fn default() -> Self {
        let conda_bin = std::env::var_os("CONDA_EXE").unwrap_or_else(|| "conda".into());
        Self {
            conda_bin,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl JobRunner for CondaJobRunner {
    #[instrument(skip_all, fields(environment = handle.name()))]
    fn invoke(
        &self,
        resolved: &ResolvedConfig,
        handle: &EnvHandle,
    ) -> Result<JobResult, LaunchError> {
        let config_path = write_resolved_config(resolved, handle)?;

        let mut cmd = Command::new(&self.conda_bin);
        cmd.arg("run").arg("--prefix").arg(handle.prefix());
        for part in resolved.job_command() {
            cmd.arg(part);
        }
        cmd.arg(&config_path);

        info!(command = ?resolved.job_command(), "invoking job");
        let output = run_command(cmd, resolved.job_timeout(), self.output_limit_bytes)
            .map_err(|source| LaunchError::JobLaunchFailure { source })?;

        if output.timed_out {
            let secs = resolved.job_timeout().map(|t| t.as_secs()).unwrap_or(0);
            return Err(LaunchError::JobTimeout { secs });
        }

        let exit_code = output.status.code().unwrap_or(-1);
        let error_text = String::from_utf8_lossy(&output.stderr).into_owned();
        if exit_code != 0 {
            warn!(exit_code, "job reported failure");
        } else {
            debug!("job completed successfully");
        }
        Ok(JobResult {
            exit_code,
            error_text,
        })
    }
}

/// Serialize the merged config next to nothing the job could clobber:
/// the scratch directory exists only for this invocation.
fn write_resolved_config(
    resolved: &ResolvedConfig,
    handle: &EnvHandle,
) -> Result<std::path::PathBuf, LaunchError> {
    let path = handle.scratch().join(RESOLVED_CONFIG_FILE);
    let mut payload = resolved.to_yaml()?;
    if !payload.ends_with('\n') {
        payload.push('\n');
    }
    fs::write(&path, payload).map_err(|e| LaunchError::io(format!("write {}", path.display()), e))?;
    Ok(path)
}
