//! Two-stage configuration loader.
//!
//! The user config (end-user-editable) names a system config
//! (deployment-fixed, not exposed to end users) via its `sys_config`
//! key. Both are flat YAML mappings; the user tier is overlaid on the
//! system tier and the merge validated into a
//! [`ResolvedConfig`](crate::core::resolved::ResolvedConfig).

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, instrument};

use crate::core::merge::{ConfigMap, merge};
use crate::core::resolved::ResolvedConfig;
use crate::error::LaunchError;

/// Key in the user config pointing at the system config file.
pub const SYS_CONFIG_KEY: &str = "sys_config";
/// Fallback system config location, relative to the user config's directory.
pub const DEFAULT_SYSTEM_CONFIG: &str = "system.yaml";

/// Load both config tiers and merge them, user keys winning.
///
/// The only side effects are the two file reads. Relative `sys_config`
/// paths resolve against the user config's directory, so a config
/// bundle can be moved around as a unit.
#[instrument(skip_all, fields(user_config = %user_config_path.display()))]
pub fn resolve(user_config_path: &Path) -> Result<ResolvedConfig, LaunchError> {
    if !user_config_path.exists() {
        return Err(LaunchError::ConfigNotFound {
            path: user_config_path.to_path_buf(),
        });
    }
    let user_raw = fs::read_to_string(user_config_path)
        .map_err(|e| LaunchError::io(format!("read {}", user_config_path.display()), e))?;
    let user: ConfigMap =
        serde_yaml::from_str(&user_raw).map_err(|source| LaunchError::ConfigParse {
            path: user_config_path.to_path_buf(),
            source,
        })?;

    let system_path = system_config_path(user_config_path, &user)?;
    debug!(system_config = %system_path.display(), "loading system config");

    if !system_path.exists() {
        return Err(LaunchError::SystemConfigNotFound {
            path: system_path,
            user_path: user_config_path.to_path_buf(),
        });
    }
    let system_raw = fs::read_to_string(&system_path)
        .map_err(|e| LaunchError::io(format!("read {}", system_path.display()), e))?;
    let system: ConfigMap =
        serde_yaml::from_str(&system_raw).map_err(|source| LaunchError::SystemConfigParse {
            path: system_path,
            source,
        })?;

    ResolvedConfig::from_merged(merge(&system, &user))
}

/// Locate the system config: explicit `sys_config` key, else the fixed
/// default next to the user config.
fn system_config_path(user_config_path: &Path, user: &ConfigMap) -> Result<PathBuf, LaunchError> {
    let referenced = match user.get(SYS_CONFIG_KEY) {
        None | Some(Value::Null) => PathBuf::from(DEFAULT_SYSTEM_CONFIG),
        Some(Value::String(s)) if !s.trim().is_empty() => PathBuf::from(s.trim()),
        Some(_) => {
            return Err(LaunchError::InvalidValue {
                key: SYS_CONFIG_KEY.to_string(),
                expected: "non-empty string path",
            });
        }
    };

    if referenced.is_absolute() {
        return Ok(referenced);
    }
    let base = user_config_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(referenced))
}
