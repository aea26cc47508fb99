//! Vault configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;

/// Catalog file name inside the config directory.
const CATALOG_FILE: &str = "catalog.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: \"{value}\" ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Image vault configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Daemon control socket.
    pub socket_path: PathBuf,

    /// Project namespace every request is scoped to.
    pub project: String,

    /// Timeout of probes, deletions and the download trigger.
    pub request_timeout: Duration,

    /// Timeout of each operation status poll.
    pub poll_timeout: Duration,

    /// Pause between operation status polls.
    pub poll_interval: Duration,

    /// Image catalog file.
    pub catalog_path: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/var/lib/vmvault/daemon.sock"),
            project: "vmvault".to_string(),
            request_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            catalog_path: default_catalog_path(),
            log_level: "info".to_string(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            socket_path: lookup("VMVAULT_SOCKET")
                .map(PathBuf::from)
                .unwrap_or(defaults.socket_path),
            project: lookup("VMVAULT_PROJECT").unwrap_or(defaults.project),
            request_timeout: millis(&lookup, "VMVAULT_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout),
            poll_timeout: millis(&lookup, "VMVAULT_POLL_TIMEOUT_MS")?
                .unwrap_or(defaults.poll_timeout),
            poll_interval: millis(&lookup, "VMVAULT_POLL_INTERVAL_MS")?
                .unwrap_or(defaults.poll_interval),
            catalog_path: lookup("VMVAULT_CATALOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            log_level: lookup("VMVAULT_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn millis<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

fn default_catalog_path() -> PathBuf {
    ProjectDirs::from("io", "vmvault", "vmvault")
        .map(|dirs| dirs.config_dir().join(CATALOG_FILE))
        .unwrap_or_else(|| PathBuf::from("/etc/vmvault").join(CATALOG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VaultConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/var/lib/vmvault/daemon.sock"));
        assert_eq!(config.project, "vmvault");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.catalog_path.ends_with(CATALOG_FILE));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = VaultConfig::from_lookup(lookup(&[
            ("VMVAULT_SOCKET", "/run/daemon/unix.socket"),
            ("VMVAULT_PROJECT", "testing"),
            ("VMVAULT_POLL_INTERVAL_MS", "250"),
            ("VMVAULT_CATALOG", "/tmp/catalog.toml"),
        ]))
        .unwrap();

        assert_eq!(config.socket_path, PathBuf::from("/run/daemon/unix.socket"));
        assert_eq!(config.project, "testing");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.catalog_path, PathBuf::from("/tmp/catalog.toml"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case("VMVAULT_REQUEST_TIMEOUT_MS", "soon")]
    #[case("VMVAULT_POLL_TIMEOUT_MS", "-5")]
    #[case("VMVAULT_POLL_INTERVAL_MS", "0")]
    fn test_invalid_durations_are_rejected(#[case] var: &str, #[case] value: &str) {
        let err = VaultConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
        let ConfigError::InvalidValue { var: reported, .. } = err;
        assert_eq!(reported, var);
    }
}
