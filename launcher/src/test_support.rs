//! Test-only doubles for environments and job execution.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::resolved::ResolvedConfig;
use crate::error::LaunchError;
use crate::io::env::{EnvHandle, EnvironmentManager};
use crate::io::job::{JobResult, JobRunner};

/// Write a config fixture under `dir` and return its path.
pub fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write config fixture");
    path
}

/// Environment manager recording acquire/release calls.
#[derive(Default)]
pub struct ScriptedEnvManager {
    fail_acquire: bool,
    acquires: Mutex<Vec<String>>,
    releases: Mutex<Vec<String>>,
}

impl ScriptedEnvManager {
    /// Manager whose `acquire` always reports the environment unavailable.
    pub fn failing() -> Self {
        Self {
            fail_acquire: true,
            ..Self::default()
        }
    }

    /// Environment names passed to `acquire`, in call order.
    pub fn acquires(&self) -> Vec<String> {
        self.acquires.lock().expect("lock").clone()
    }

    /// Environment names released, in call order (idempotent repeats excluded).
    pub fn releases(&self) -> Vec<String> {
        self.releases.lock().expect("lock").clone()
    }
}

impl EnvironmentManager for ScriptedEnvManager {
    fn acquire(&self, name: &str) -> Result<EnvHandle, LaunchError> {
        self.acquires.lock().expect("lock").push(name.to_string());
        if self.fail_acquire {
            return Err(LaunchError::EnvironmentUnavailable {
                name: name.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(EnvHandle::detached(name))
    }

    fn release(&self, handle: &mut EnvHandle) {
        if !handle.mark_released() {
            return;
        }
        self.releases
            .lock()
            .expect("lock")
            .push(handle.name().to_string());
    }
}

/// Job runner returning queued results without spawning processes.
pub struct ScriptedJobRunner {
    script: Mutex<VecDeque<Result<JobResult, LaunchError>>>,
    invocations: Mutex<Vec<String>>,
}

impl ScriptedJobRunner {
    pub fn new(script: Vec<Result<JobResult, LaunchError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Runner that always reports a clean exit.
    pub fn succeeding() -> Self {
        Self::new(vec![Ok(JobResult {
            exit_code: 0,
            error_text: String::new(),
        })])
    }

    /// Runner whose single invocation exits with `code`.
    pub fn exiting(code: i32) -> Self {
        Self::new(vec![Ok(JobResult {
            exit_code: code,
            error_text: format!("job failed with status {code}"),
        })])
    }

    /// Runner whose single invocation fails with `err`.
    pub fn erroring(err: LaunchError) -> Self {
        Self::new(vec![Err(err)])
    }

    /// Environment names the runner was invoked under, in call order.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().expect("lock").clone()
    }
}

impl JobRunner for ScriptedJobRunner {
    fn invoke(
        &self,
        _resolved: &ResolvedConfig,
        handle: &EnvHandle,
    ) -> Result<JobResult, LaunchError> {
        self.invocations
            .lock()
            .expect("lock")
            .push(handle.name().to_string());
        self.script
            .lock()
            .expect("lock")
            .pop_front()
            .expect("scripted job runner exhausted")
    }
}
