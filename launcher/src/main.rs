//! CLI entry point: one positional argument, the user config path.

use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use launcher::exit_codes;
use launcher::io::env::CondaEnvManager;
use launcher::io::job::CondaJobRunner;
use launcher::launch::run_launch;
use launcher::logging;

#[derive(Parser)]
#[command(
    name = "launcher",
    version,
    about = "Run a processing job in a pinned, isolated environment"
)]
struct Cli {
    /// Path to the user configuration file (YAML).
    user_config: PathBuf,
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let environments = CondaEnvManager::default();
    let jobs = CondaJobRunner::default();

    let code = match run_launch(&cli.user_config, &environments, &jobs) {
        Ok(result) => {
            if !result.success() && !result.error_text.is_empty() {
                eprint!("{}", result.error_text);
            }
            // Exit code mirrors the job's, zero or not.
            result.exit_code
        }
        Err(err) => {
            error!(err = %err, "launch failed");
            // Error messages name the offending file or key themselves.
            eprintln!("launcher: {err}");
            exit_codes::SETUP_FAILURE
        }
    };
    std::process::exit(code);
}
