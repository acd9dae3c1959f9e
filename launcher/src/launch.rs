//! Launch sequencing: resolve, acquire, invoke, release.
//!
//! The flow is linear with failure short-circuits only:
//!
//! ```text
//! RESOLVE_CONFIG -> ACQUIRE_ENV -> INVOKE_JOB -> RELEASE_ENV
//! ```
//!
//! A resolver failure never reaches `acquire`; an acquisition failure
//! never reaches `invoke` and has nothing to release. Once acquisition
//! succeeds, release runs unconditionally before the job's outcome is
//! surfaced.

use std::path::Path;

use tracing::{debug, info};

use crate::error::LaunchError;
use crate::io::config::resolve;
use crate::io::env::{EnvGuard, EnvironmentManager};
use crate::io::job::{JobResult, JobRunner};

/// Run one launch end to end.
///
/// `Ok` carries the job's own result, including non-zero exits; `Err`
/// means the launcher failed around the job (setup, launch, timeout).
pub fn run_launch<M, J>(
    user_config_path: &Path,
    environments: &M,
    jobs: &J,
) -> Result<JobResult, LaunchError>
where
    M: EnvironmentManager + ?Sized,
    J: JobRunner + ?Sized,
{
    let resolved = resolve(user_config_path)?;
    debug!(environment = resolved.environment(), "configuration resolved");

    let handle = environments.acquire(resolved.environment())?;
    let guard = EnvGuard::new(environments, handle);

    let result = jobs.invoke(&resolved, guard.handle());

    // Release happens-after job completion on every path from here on,
    // including the error path below and panics inside `invoke`.
    drop(guard);

    let job = result?;
    info!(exit_code = job.exit_code, "launch finished");
    Ok(job)
}
