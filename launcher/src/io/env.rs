//! Scoped acquisition of pinned runtime environments.
//!
//! `acquire` hands out an [`EnvHandle`]; `release` is idempotent,
//! best-effort, and never propagates an error, because by the time it
//! runs the job's outcome is already determined. [`EnvGuard`] makes
//! release run on every exit path after a successful acquisition.
//!
//! At most one concurrent acquisition of a given named environment is
//! assumed; no cross-process locking is attempted.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::LaunchError;

/// Token for an acquired environment scope.
///
/// Carries the environment's on-disk prefix and a per-invocation scratch
/// directory that lives exactly as long as the acquisition.
#[derive(Debug)]
pub struct EnvHandle {
    name: String,
    prefix: PathBuf,
    scratch: PathBuf,
    released: bool,
}

impl EnvHandle {
    pub(crate) fn new(name: String, prefix: PathBuf, scratch: PathBuf) -> Self {
        Self {
            name,
            prefix,
            scratch,
            released: false,
        }
    }

    /// Handle pointing at nonexistent paths, for scripted managers.
    #[cfg(any(test, feature = "test-support"))]
    pub fn detached(name: &str) -> Self {
        let scratch = std::env::temp_dir().join(format!("launch-detached-{name}"));
        Self::new(name.to_string(), scratch.join("prefix"), scratch)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root directory of the pinned environment.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Per-invocation scratch directory, removed at release.
    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Flip the released flag; returns false if already released.
    pub(crate) fn mark_released(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }
}

/// Abstraction over environment backends. Tests use scripted managers
/// that record acquire/release calls without touching conda.
pub trait EnvironmentManager {
    /// Activate the named pinned-dependency environment.
    fn acquire(&self, name: &str) -> Result<EnvHandle, LaunchError>;

    /// Best-effort teardown. Idempotent; must not panic or propagate errors.
    fn release(&self, handle: &mut EnvHandle);
}

/// Environment manager backed by conda named environments.
pub struct CondaEnvManager {
    conda_bin: OsString,
}

impl Default for CondaEnvManager {
    fn default() -> Self {
        let conda_bin = std::env::var_os("CONDA_EXE").unwrap_or_else(|| "conda".into());
        Self { conda_bin }
    }
}

#[derive(Debug, Deserialize)]
struct CondaEnvList {
    envs: Vec<PathBuf>,
}

impl EnvironmentManager for CondaEnvManager {
    #[instrument(skip(self))]
    fn acquire(&self, name: &str) -> Result<EnvHandle, LaunchError> {
        let output = Command::new(&self.conda_bin)
            .args(["env", "list", "--json"])
            .output()
            .map_err(|e| unavailable(name, format!("failed to run conda: {e}")))?;
        if !output.status.success() {
            return Err(unavailable(
                name,
                format!(
                    "conda env list failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let listing: CondaEnvList = serde_json::from_slice(&output.stdout)
            .map_err(|e| unavailable(name, format!("unparseable conda env list: {e}")))?;
        let prefix = find_env_prefix(&listing.envs, name)
            .ok_or_else(|| unavailable(name, "not installed".to_string()))?;

        // A prefix without pinned package metadata is a corrupted install.
        if !prefix.join("conda-meta").is_dir() {
            return Err(unavailable(
                name,
                format!("corrupted: {} has no conda-meta", prefix.display()),
            ));
        }

        let scratch = tempfile::Builder::new()
            .prefix("launch-")
            .tempdir()
            .map_err(|e| LaunchError::io("create scratch directory", e))?
            .keep();

        info!(prefix = %prefix.display(), scratch = %scratch.display(), "environment acquired");
        Ok(EnvHandle::new(name.to_string(), prefix, scratch))
    }

    #[instrument(skip_all, fields(name = handle.name()))]
    fn release(&self, handle: &mut EnvHandle) {
        if !handle.mark_released() {
            debug!("environment already released");
            return;
        }
        if handle.scratch().exists() {
            if let Err(err) = fs::remove_dir_all(handle.scratch()) {
                warn!(scratch = %handle.scratch().display(), err = %err,
                    "failed to remove scratch directory");
                return;
            }
        }
        info!("environment released");
    }
}

/// Match a named environment against conda's prefix listing.
fn find_env_prefix(envs: &[PathBuf], name: &str) -> Option<PathBuf> {
    envs.iter()
        .find(|prefix| prefix.file_name().is_some_and(|f| f == name))
        .cloned()
}

fn unavailable(name: &str, reason: String) -> LaunchError {
    LaunchError::EnvironmentUnavailable {
        name: name.to_string(),
        reason,
    }
}

/// Scope guard tying release to the end of the invocation.
///
/// Dropping the guard releases the handle, so release happens on
/// success, on error returns after acquisition, and on panics.
pub struct EnvGuard<'a, M: EnvironmentManager + ?Sized> {
    manager: &'a M,
    handle: Option<EnvHandle>,
}

impl<'a, M: EnvironmentManager + ?Sized> EnvGuard<'a, M> {
    pub fn new(manager: &'a M, handle: EnvHandle) -> Self {
        Self {
            manager,
            handle: Some(handle),
        }
    }

    pub fn handle(&self) -> &EnvHandle {
        self.handle
            .as_ref()
            .unwrap_or_else(|| unreachable!("handle present until drop"))
    }
}

impl<M: EnvironmentManager + ?Sized> Drop for EnvGuard<'_, M> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            self.manager.release(&mut handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedEnvManager;

    #[test]
    fn find_env_prefix_matches_trailing_component() {
        let envs = vec![
            PathBuf::from("/opt/conda"),
            PathBuf::from("/opt/conda/envs/proc"),
            PathBuf::from("/opt/conda/envs/other"),
        ];
        assert_eq!(
            find_env_prefix(&envs, "proc"),
            Some(PathBuf::from("/opt/conda/envs/proc"))
        );
        assert_eq!(find_env_prefix(&envs, "absent"), None);
    }

    #[test]
    fn acquire_fails_when_conda_is_missing() {
        let manager = CondaEnvManager {
            conda_bin: "definitely-not-conda".into(),
        };
        let err = manager.acquire("proc").expect_err("no conda");
        assert!(matches!(err, LaunchError::EnvironmentUnavailable { .. }));
    }

    #[test]
    fn guard_releases_exactly_once_on_drop() {
        let manager = ScriptedEnvManager::default();
        {
            let handle = manager.acquire("proc").expect("acquire");
            let _guard = EnvGuard::new(&manager, handle);
        }
        assert_eq!(manager.releases(), vec!["proc".to_string()]);
    }

    #[test]
    fn scripted_release_is_idempotent() {
        let manager = ScriptedEnvManager::default();
        let mut handle = manager.acquire("proc").expect("acquire");
        assert!(!handle.is_released());
        manager.release(&mut handle);
        assert!(handle.is_released());
        manager.release(&mut handle);
        assert_eq!(manager.releases().len(), 1);
    }
}
