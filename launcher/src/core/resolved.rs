//! Validated merge result consumed by the job invoker.

use std::time::Duration;

use serde_yaml::Value;

use crate::core::merge::ConfigMap;
use crate::error::LaunchError;

/// Key naming the pinned runtime environment the job runs in.
pub const ENVIRONMENT_KEY: &str = "environment";
/// Key holding the opaque job executable and its fixed arguments.
pub const JOB_COMMAND_KEY: &str = "job_command";
/// Optional wall-clock budget for the job, in seconds.
pub const JOB_TIMEOUT_KEY: &str = "job_timeout_secs";

/// Merged configuration with the keys the invocation needs pulled out
/// and validated up front.
///
/// Created once per invocation by [`crate::io::config::resolve`] and
/// consumed by the job invoker; never persisted beyond the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    environment: String,
    job_command: Vec<String>,
    job_timeout: Option<Duration>,
    values: ConfigMap,
}

impl ResolvedConfig {
    /// Validate a merged mapping into a usable config.
    ///
    /// Fails with `MissingRequiredKey` when `environment` or
    /// `job_command` is absent or empty, and `InvalidValue` when a key
    /// is present with an unusable type.
    pub fn from_merged(values: ConfigMap) -> Result<Self, LaunchError> {
        let environment = required_string(&values, ENVIRONMENT_KEY)?;
        let job_command = job_command(&values)?;
        let job_timeout = job_timeout(&values)?;

        Ok(Self {
            environment,
            job_command,
            job_timeout,
            values,
        })
    }

    /// Name of the pinned environment the job must run in.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Job executable and fixed arguments, in order.
    pub fn job_command(&self) -> &[String] {
        &self.job_command
    }

    /// Wall-clock budget for the job, when configured.
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Serialize the full merged mapping for the job handoff.
    ///
    /// Keys are emitted in sorted order, so identical inputs always
    /// produce byte-identical output.
    pub fn to_yaml(&self) -> Result<String, LaunchError> {
        Ok(serde_yaml::to_string(&self.values)?)
    }
}

fn required_string(values: &ConfigMap, key: &str) -> Result<String, LaunchError> {
    match values.get(key) {
        None | Some(Value::Null) => Err(LaunchError::MissingRequiredKey {
            key: key.to_string(),
        }),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(LaunchError::MissingRequiredKey {
                    key: key.to_string(),
                });
            }
            Ok(trimmed.to_string())
        }
        Some(_) => Err(LaunchError::InvalidValue {
            key: key.to_string(),
            expected: "non-empty string",
        }),
    }
}

/// Accepts either a sequence of strings or a single whitespace-split string.
fn job_command(values: &ConfigMap) -> Result<Vec<String>, LaunchError> {
    let command = match values.get(JOB_COMMAND_KEY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        Some(Value::Sequence(parts)) => {
            let mut command = Vec::with_capacity(parts.len());
            for part in parts {
                match part {
                    Value::String(s) if !s.trim().is_empty() => command.push(s.clone()),
                    _ => {
                        return Err(LaunchError::InvalidValue {
                            key: JOB_COMMAND_KEY.to_string(),
                            expected: "sequence of non-empty strings",
                        });
                    }
                }
            }
            command
        }
        Some(_) => {
            return Err(LaunchError::InvalidValue {
                key: JOB_COMMAND_KEY.to_string(),
                expected: "string or sequence of strings",
            });
        }
    };

    if command.is_empty() {
        return Err(LaunchError::MissingRequiredKey {
            key: JOB_COMMAND_KEY.to_string(),
        });
    }
    Ok(command)
}

fn job_timeout(values: &ConfigMap) -> Result<Option<Duration>, LaunchError> {
    match values.get(JOB_TIMEOUT_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(LaunchError::InvalidValue {
                key: JOB_TIMEOUT_KEY.to_string(),
                expected: "positive integer seconds",
            }),
        },
        Some(_) => Err(LaunchError::InvalidValue {
            key: JOB_TIMEOUT_KEY.to_string(),
            expected: "positive integer seconds",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_map() -> ConfigMap {
        let mut values = ConfigMap::new();
        values.insert(ENVIRONMENT_KEY.to_string(), Value::from("proc"));
        values.insert(
            JOB_COMMAND_KEY.to_string(),
            Value::Sequence(vec![Value::from("python"), Value::from("process.py")]),
        );
        values
    }

    #[test]
    fn typed_accessors_reflect_the_mapping() {
        let mut values = base_map();
        values.insert(JOB_TIMEOUT_KEY.to_string(), Value::from(600));
        values.insert("threshold".to_string(), Value::from(0.5));

        let resolved = ResolvedConfig::from_merged(values).expect("resolve");
        assert_eq!(resolved.environment(), "proc");
        assert_eq!(resolved.job_command(), ["python", "process.py"]);
        assert_eq!(resolved.job_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(resolved.get("threshold"), Some(&Value::from(0.5)));
    }

    #[test]
    fn job_command_accepts_whitespace_split_string() {
        let mut values = base_map();
        values.insert(JOB_COMMAND_KEY.to_string(), Value::from("python process.py"));

        let resolved = ResolvedConfig::from_merged(values).expect("resolve");
        assert_eq!(resolved.job_command(), ["python", "process.py"]);
    }

    #[test]
    fn missing_environment_is_rejected() {
        let mut values = base_map();
        values.remove(ENVIRONMENT_KEY);

        let err = ResolvedConfig::from_merged(values).expect_err("missing key");
        assert!(matches!(
            err,
            LaunchError::MissingRequiredKey { ref key } if key == ENVIRONMENT_KEY
        ));
    }

    #[test]
    fn empty_environment_counts_as_missing() {
        let mut values = base_map();
        values.insert(ENVIRONMENT_KEY.to_string(), Value::from("  "));

        let err = ResolvedConfig::from_merged(values).expect_err("empty value");
        assert!(matches!(err, LaunchError::MissingRequiredKey { .. }));
    }

    #[test]
    fn non_string_command_part_is_rejected() {
        let mut values = base_map();
        values.insert(
            JOB_COMMAND_KEY.to_string(),
            Value::Sequence(vec![Value::from("python"), Value::from(3)]),
        );

        let err = ResolvedConfig::from_merged(values).expect_err("bad command");
        assert!(matches!(err, LaunchError::InvalidValue { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut values = base_map();
        values.insert(JOB_TIMEOUT_KEY.to_string(), Value::from(0));

        let err = ResolvedConfig::from_merged(values).expect_err("zero timeout");
        assert!(matches!(err, LaunchError::InvalidValue { .. }));
    }

    #[test]
    fn serialization_is_deterministic() {
        let mut values = base_map();
        values.insert("corpus".to_string(), Value::from("A549"));
        let resolved = ResolvedConfig::from_merged(values).expect("resolve");

        assert_eq!(
            resolved.to_yaml().expect("yaml"),
            resolved.to_yaml().expect("yaml")
        );
    }
}
