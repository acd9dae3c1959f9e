//! CLI tests for the launcher binary.
//!
//! Spawns the binary and verifies process exit codes: setup failures
//! report the dedicated code, job statuses are forwarded verbatim. A
//! stub conda on `CONDA_EXE` stands in for the environment backend.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use launcher::exit_codes;
use launcher::test_support::write_config;

fn launcher_cmd(user_config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_launcher"));
    cmd.arg(user_config);
    cmd
}

/// Stub conda: answers `env list --json` with one prefix and replays
/// `run --prefix <prefix> <cmd...>` as the command itself.
fn write_stub_conda(dir: &Path, prefix: &Path) -> PathBuf {
    let script = format!(
        concat!(
            "#!/bin/sh\n",
            "if [ \"$1\" = env ]; then\n",
            "  echo '{{\"envs\": [\"{prefix}\"]}}'\n",
            "  exit 0\n",
            "fi\n",
            "shift 3\n",
            "exec \"$@\"\n",
        ),
        prefix = prefix.display()
    );
    let path = dir.join("conda");
    fs::write(&path, script).expect("write stub conda");
    let mut perms = fs::metadata(&path).expect("stat stub conda").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub conda");
    path
}

/// Pinned environment prefix the stub conda advertises.
fn create_env_prefix(dir: &Path, name: &str) -> PathBuf {
    let prefix = dir.join("envs").join(name);
    fs::create_dir_all(prefix.join("conda-meta")).expect("create env prefix");
    prefix
}

fn write_config_pair(dir: &Path, job_command: &str) -> PathBuf {
    write_config(
        dir,
        "sys.yaml",
        &format!("environment: proc\njob_command: {job_command}\n"),
    );
    write_config(dir, "run.yaml", "sys_config: sys.yaml\n")
}

#[test]
fn missing_user_config_exits_with_setup_failure() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = launcher_cmd(&temp.path().join("missing.yaml"))
        .status()
        .expect("launcher");

    assert_eq!(status.code(), Some(exit_codes::SETUP_FAILURE));
}

#[test]
fn dangling_system_reference_exits_with_setup_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let user_config = write_config(
        temp.path(),
        "run.yaml",
        "sys_config: does-not-exist.yaml\n",
    );

    let status = launcher_cmd(&user_config).status().expect("launcher");

    assert_eq!(status.code(), Some(exit_codes::SETUP_FAILURE));
}

#[test]
fn unavailable_environment_exits_with_setup_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let user_config = write_config_pair(temp.path(), "[sh, -c, 'exit 0']");

    let status = launcher_cmd(&user_config)
        .env("CONDA_EXE", temp.path().join("no-such-conda"))
        .status()
        .expect("launcher");

    assert_eq!(status.code(), Some(exit_codes::SETUP_FAILURE));
}

#[test]
fn successful_job_exits_ok() {
    let temp = tempfile::tempdir().expect("tempdir");
    let prefix = create_env_prefix(temp.path(), "proc");
    let stub_conda = write_stub_conda(temp.path(), &prefix);
    let user_config = write_config_pair(temp.path(), "[sh, -c, 'exit 0']");

    let status = launcher_cmd(&user_config)
        .env("CONDA_EXE", &stub_conda)
        .status()
        .expect("launcher");

    assert_eq!(status.code(), Some(exit_codes::OK));
}

#[test]
fn job_exit_status_is_forwarded_verbatim() {
    let temp = tempfile::tempdir().expect("tempdir");
    let prefix = create_env_prefix(temp.path(), "proc");
    let stub_conda = write_stub_conda(temp.path(), &prefix);
    let user_config = write_config_pair(temp.path(), "[sh, -c, 'exit 2']");

    let status = launcher_cmd(&user_config)
        .env("CONDA_EXE", &stub_conda)
        .status()
        .expect("launcher");

    // Job-reported failure, not the setup-failure code.
    assert_eq!(status.code(), Some(2));
}
