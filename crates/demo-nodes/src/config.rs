//! Runtime settings – reads `~/.demo_nodes/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! `DEMO_NODES_*` environment variables override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use demo_types::MwError;
use serde::{Deserialize, Serialize};

/// Timing and QoS knobs shared by the demo nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Talker timer period in milliseconds.
    #[serde(default = "default_publish_period_ms")]
    pub publish_period_ms: u64,

    /// How long one `wait_for_service` attempt of the client lasts.
    #[serde(default = "default_service_wait_timeout_ms")]
    pub service_wait_timeout_ms: u64,

    /// History depth of the talker's publisher.
    #[serde(default = "default_talker_qos_depth")]
    pub talker_qos_depth: usize,

    /// History depth of the listener's subscription.
    #[serde(default = "default_listener_qos_depth")]
    pub listener_qos_depth: usize,
}

fn default_publish_period_ms() -> u64 {
    1000
}
fn default_service_wait_timeout_ms() -> u64 {
    1000
}
fn default_talker_qos_depth() -> usize {
    7
}
fn default_listener_qos_depth() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            publish_period_ms: default_publish_period_ms(),
            service_wait_timeout_ms: default_service_wait_timeout_ms(),
            talker_qos_depth: default_talker_qos_depth(),
            listener_qos_depth: default_listener_qos_depth(),
        }
    }
}

impl Config {
    pub fn publish_period(&self) -> Duration {
        Duration::from_millis(self.publish_period_ms)
    }

    pub fn service_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.service_wait_timeout_ms)
    }

    /// Reject values no node can run with.
    pub fn validate(&self) -> Result<(), MwError> {
        if self.publish_period_ms == 0 {
            return Err(MwError::Config("publish_period_ms must be non-zero".to_string()));
        }
        if self.service_wait_timeout_ms == 0 {
            return Err(MwError::Config(
                "service_wait_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Return the path to `~/.demo_nodes/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".demo_nodes").join("config.toml")
}

/// Load the config from the default location, falling back to defaults when
/// the file does not exist.  Environment overrides are applied either way.
pub fn load() -> Result<Config, MwError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

/// Load the file at `path`.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, MwError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| MwError::Config(format!("failed to read {}: {e}", path.display())))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| MwError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `DEMO_NODES_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `DEMO_NODES_PUBLISH_PERIOD_MS` | `publish_period_ms` |
/// | `DEMO_NODES_SERVICE_WAIT_TIMEOUT_MS` | `service_wait_timeout_ms` |
/// | `DEMO_NODES_TALKER_QOS_DEPTH` | `talker_qos_depth` |
/// | `DEMO_NODES_LISTENER_QOS_DEPTH` | `listener_qos_depth` |
///
/// Values that do not parse, or are zero, are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(v) = env_number("DEMO_NODES_PUBLISH_PERIOD_MS") {
        cfg.publish_period_ms = v;
    }
    if let Some(v) = env_number("DEMO_NODES_SERVICE_WAIT_TIMEOUT_MS") {
        cfg.service_wait_timeout_ms = v;
    }
    if let Some(v) = env_number("DEMO_NODES_TALKER_QOS_DEPTH") {
        cfg.talker_qos_depth = v;
    }
    if let Some(v) = env_number("DEMO_NODES_LISTENER_QOS_DEPTH") {
        cfg.listener_qos_depth = v;
    }
}

fn env_number<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value = std::env::var(name).ok()?.trim().parse::<T>().ok()?;
    (value != T::default()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_points_to_demo_nodes_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".demo_nodes"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "publish_period_ms = 250\n").expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.publish_period(), Duration::from_millis(250));
        assert_eq!(cfg.service_wait_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.talker_qos_depth, 7);
        assert_eq!(cfg.listener_qos_depth, 10);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "publish_period_ms = \"soon\"\n").expect("write");
        assert!(matches!(load_from(&path), Err(MwError::Config(_))));
    }

    #[test]
    fn default_roundtrips_through_toml() {
        let raw = toml::to_string_pretty(&Config::default()).expect("serialize");
        let back: Config = toml::from_str(&raw).expect("parse");
        assert_eq!(back, Config::default());
    }

    #[test]
    fn zero_period_fails_validation() {
        let cfg = Config {
            publish_period_ms: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(MwError::Config(_))));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn apply_env_overrides_changes_publish_period() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("DEMO_NODES_PUBLISH_PERIOD_MS", "50") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.publish_period_ms, 50);
        unsafe { std::env::remove_var("DEMO_NODES_PUBLISH_PERIOD_MS") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_depth() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("DEMO_NODES_TALKER_QOS_DEPTH", "deep") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.talker_qos_depth, 7);
        unsafe { std::env::remove_var("DEMO_NODES_TALKER_QOS_DEPTH") };
    }

    #[test]
    fn apply_env_overrides_ignores_zero_timeout() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("DEMO_NODES_SERVICE_WAIT_TIMEOUT_MS", "0") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.service_wait_timeout_ms, 1000);
        unsafe { std::env::remove_var("DEMO_NODES_SERVICE_WAIT_TIMEOUT_MS") };
    }
}
