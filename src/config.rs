//! Application configuration management.
//!
//! Handles config directory resolution (CLI flag / env > platform config
//! dir), loading `config.toml`, and writing it back when the monitored
//! service selection changes. The persisted service name is the one piece of
//! configuration the engine consumes at construction time; everything else
//! is timing and endpoint tuning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::core::monitor::MonitorConfig;

/// User-configurable application settings.
///
/// All fields have sensible defaults. Users can override any subset via
/// `config.toml` in the config directory -- missing fields use defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Name of the VPN service to monitor. Empty until the user picks one
    /// (`tunnelwatch use <name>`) or passes `--service`.
    pub service_name: String,
    /// Fallback status poll interval in seconds.
    pub status_poll_secs: u64,
    /// Interface-table probe interval in milliseconds.
    pub path_probe_ms: u64,
    /// Settle delay after connect/disconnect, in milliseconds.
    pub settle_delay_ms: u64,
    /// Disconnect-enforcer tick period in milliseconds.
    pub guard_tick_ms: u64,
    /// Whether `disconnect` arms the enforcer against auto-reconnects.
    pub enforce_disconnect: bool,
    /// Minimum interval between public-IP lookups, in seconds.
    pub public_ip_ttl_secs: u64,
    /// IP echo endpoints, tried in order. Empty disables the lookup.
    pub public_ip_apis: Vec<String>,
    /// Timeout for each IP echo call, in seconds.
    pub api_timeout_secs: u64,
    /// Upper bound on a status/list command invocation, in seconds.
    pub command_timeout_secs: u64,
    /// Minimum log level (`"debug"`, `"info"`, `"warning"`, `"error"`).
    pub log_level: String,
    /// Maximum number of log entries kept in memory.
    pub max_log_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            status_poll_secs: constants::DEFAULT_STATUS_POLL_SECS,
            path_probe_ms: constants::DEFAULT_PATH_PROBE_MS,
            settle_delay_ms: constants::DEFAULT_SETTLE_DELAY_MS,
            guard_tick_ms: constants::DEFAULT_GUARD_TICK_MS,
            enforce_disconnect: true,
            public_ip_ttl_secs: constants::DEFAULT_PUBLIC_IP_TTL_SECS,
            public_ip_apis: constants::DEFAULT_IP_ECHO_APIS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            api_timeout_secs: constants::DEFAULT_API_TIMEOUT_SECS,
            command_timeout_secs: constants::DEFAULT_COMMAND_TIMEOUT_SECS,
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
            max_log_entries: constants::DEFAULT_MAX_LOG_ENTRIES,
        }
    }
}

impl AppConfig {
    /// Engine knobs derived from this configuration.
    #[must_use]
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_secs(self.status_poll_secs),
            path_probe_interval: Duration::from_millis(self.path_probe_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            guard_tick: Duration::from_millis(self.guard_tick_ms),
            public_ip_ttl: Duration::from_secs(self.public_ip_ttl_secs),
            public_ip_apis: self.public_ip_apis.clone(),
            api_timeout_secs: self.api_timeout_secs,
            enforce_disconnect: self.enforce_disconnect,
        }
    }

    /// Bound for a single status/list command invocation.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Resolves the config directory path.
///
/// Precedence: CLI flag / `TUNNELWATCH_CONFIG_DIR` > platform config dir.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined or created.
pub fn resolve_config_dir(cli_override: Option<&PathBuf>) -> std::io::Result<PathBuf> {
    let path = if let Some(dir) = cli_override {
        // Resolve relative paths to absolute so the config dir is stable
        // regardless of the working directory.
        if dir.is_relative() {
            std::env::current_dir()?.join(dir)
        } else {
            dir.clone()
        }
    } else {
        dirs::config_dir()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "Config directory not found")
            })?
            .join(constants::APP_NAME)
    };

    if !path.exists() {
        std::fs::create_dir_all(&path)?;
    }

    // Canonicalize to resolve symlinks and ".." components
    std::fs::canonicalize(&path)
}

/// Loads `AppConfig` from `config.toml` in the given directory.
///
/// Returns defaults if the file doesn't exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(config_dir: &Path) -> Result<AppConfig, String> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .map_err(|e| format!("Failed to read {}: {e}", config_path.display()))?;

    toml::from_str(&content)
        .map_err(|e| format!("Invalid config at {}: {e}", config_path.display()))
}

/// Writes `config.toml` back, preserving the full setting set.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_config(config_dir: &Path, config: &AppConfig) -> Result<(), String> {
    let config_path = config_dir.join("config.toml");
    let content = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;
    std::fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write {}: {e}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- AppConfig defaults ----

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.service_name, "");
        assert_eq!(config.status_poll_secs, 3);
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(config.guard_tick_ms, 500);
        assert_eq!(config.public_ip_ttl_secs, 30);
        assert_eq!(config.public_ip_apis.len(), 3);
        assert!(config.enforce_disconnect);
    }

    #[test]
    fn test_monitor_config_derivation() {
        let config = AppConfig {
            status_poll_secs: 7,
            guard_tick_ms: 250,
            ..AppConfig::default()
        };
        let mc = config.monitor_config();
        assert_eq!(mc.poll_interval, Duration::from_secs(7));
        assert_eq!(mc.guard_tick, Duration::from_millis(250));
    }

    // ---- load_config ----

    #[test]
    fn test_load_config_missing_file() {
        let dir = std::env::temp_dir().join("tunnelwatch_test_no_config");
        let _ = std::fs::create_dir_all(&dir);
        let _ = std::fs::remove_file(dir.join("config.toml"));

        let config = load_config(&dir).unwrap();
        assert_eq!(config.status_poll_secs, 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_config_partial() {
        let dir = std::env::temp_dir().join("tunnelwatch_test_partial_config");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(
            dir.join("config.toml"),
            "service_name = \"Corp VPN\"\nstatus_poll_secs = 10\n",
        )
        .unwrap();

        let config = load_config(&dir).unwrap();
        assert_eq!(config.service_name, "Corp VPN");
        assert_eq!(config.status_poll_secs, 10);
        assert_eq!(config.guard_tick_ms, 500); // default preserved

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = std::env::temp_dir().join("tunnelwatch_test_bad_config");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(dir.join("config.toml"), "status_poll_secs = [invalid\n").unwrap();

        assert!(load_config(&dir).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_config_unknown_field() {
        let dir = std::env::temp_dir().join("tunnelwatch_test_unknown_field");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(dir.join("config.toml"), "nonexistent_field = true\n").unwrap();

        assert!(load_config(&dir).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    // ---- save_config ----

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = std::env::temp_dir().join("tunnelwatch_test_save_config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let config = AppConfig {
            service_name: "Acme WireGuard".to_string(),
            enforce_disconnect: false,
            ..AppConfig::default()
        };
        save_config(&dir, &config).unwrap();

        let loaded = load_config(&dir).unwrap();
        assert_eq!(loaded.service_name, "Acme WireGuard");
        assert!(!loaded.enforce_disconnect);

        let _ = std::fs::remove_dir_all(&dir);
    }

    // ---- resolve_config_dir ----

    #[test]
    fn test_resolve_config_dir_with_override() {
        let custom = std::env::temp_dir().join("tunnelwatch_test_resolve_override");
        let _ = std::fs::remove_dir_all(&custom);
        assert!(!custom.exists());

        let result = resolve_config_dir(Some(&custom)).unwrap();
        // Compare canonicalized paths (macOS: /var -> /private/var)
        let expected = std::fs::canonicalize(&custom).unwrap();
        assert_eq!(result, expected);
        assert!(custom.is_dir());

        let _ = std::fs::remove_dir_all(&custom);
    }
}
