//! # Configuration pmocast
//!
//! Runtime configuration for the control point, including:
//! - Loading overrides from an optional YAML file
//! - Environment variable overrides applied on top of the file
//! - Thread-safe singleton access pattern
//!
//! Every field has a built-in default, so the tool runs with no
//! configuration file at all. Lookup order for the file:
//! `$PMOCAST_CONFIG` if set, else `<config_dir>/pmocast/config.yaml`
//! (e.g. `~/.config/pmocast/config.yaml` on Linux).

use std::{env, fs, path::PathBuf, sync::Arc, time::Duration};

use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::{debug, warn};

/// Variable d'environnement pointant vers le fichier de configuration.
const ENV_CONFIG_FILE: &str = "PMOCAST_CONFIG";

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load());
}

/// Returns the global configuration singleton.
///
/// The configuration is loaded once, on first access; later calls are
/// cheap clones of the same `Arc`.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Configuration du point de contrôle.
///
/// Deserialized from YAML with per-field defaults, then patched by the
/// `PMOCAST_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SSDP listen window, in seconds.
    pub discovery_secs: u64,
    /// MX value advertised in M-SEARCH requests.
    pub mx: u32,
    /// Timeout for description fetches and SOAP calls, in seconds.
    pub http_timeout_secs: u64,
    /// Interval between two GetPositionInfo polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Port for the local file server (0 = ephemeral).
    pub bind_port: u16,
    /// Local IP advertised to the renderer; `None` = auto-detect.
    pub local_ip: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_secs: 5,
            mx: 3,
            http_timeout_secs: 5,
            poll_interval_ms: 1500,
            bind_port: 0,
            local_ip: None,
        }
    }
}

impl Config {
    /// Parses a configuration from YAML text. Missing fields keep their
    /// defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// SSDP listen window as a [`Duration`].
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_secs)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Loads the configuration: file (if any), then environment overrides.
    ///
    /// Never fails: a missing file yields the defaults, a malformed file
    /// or unparsable variable is logged and skipped.
    fn load() -> Self {
        let mut config = Self::load_file().unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    fn load_file() -> Option<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return None;
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read config file {}: {}", path.display(), e);
                return None;
            }
        };
        match Self::from_yaml_str(&text) {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(ENV_CONFIG_FILE) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::config_dir().map(|dir| dir.join("pmocast").join("config.yaml"))
    }

    /// Applies the `PMOCAST_*` overrides: `PMOCAST_DISCOVERY_SECS`,
    /// `PMOCAST_MX`, `PMOCAST_HTTP_TIMEOUT_SECS`, `PMOCAST_POLL_INTERVAL_MS`,
    /// `PMOCAST_BIND_PORT`, `PMOCAST_LOCAL_IP`.
    fn apply_env_overrides(&mut self) {
        override_parsed(&mut self.discovery_secs, "PMOCAST_DISCOVERY_SECS");
        override_parsed(&mut self.mx, "PMOCAST_MX");
        override_parsed(&mut self.http_timeout_secs, "PMOCAST_HTTP_TIMEOUT_SECS");
        override_parsed(&mut self.poll_interval_ms, "PMOCAST_POLL_INTERVAL_MS");
        override_parsed(&mut self.bind_port, "PMOCAST_BIND_PORT");
        if let Ok(raw) = env::var("PMOCAST_LOCAL_IP") {
            // Chaîne vide = retour à l'auto-détection.
            self.local_ip = if raw.trim().is_empty() { None } else { Some(raw) };
        }
    }
}

/// Overwrites `slot` with the parsed value of `var`, when set and valid.
fn override_parsed<T>(slot: &mut T, var: &str)
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = env::var(var) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(e) => warn!("Ignoring {}={:?}: {}", var, raw, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.discovery_secs, 5);
        assert_eq!(config.mx, 3);
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.poll_interval_ms, 1500);
        assert_eq!(config.bind_port, 0);
        assert!(config.local_ip.is_none());
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let config = Config::from_yaml_str("poll_interval_ms: 500\n").unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.discovery_secs, 5);
        assert_eq!(config.mx, 3);
        assert!(config.local_ip.is_none());
    }

    #[test]
    fn full_yaml_overrides_everything() {
        let text = "\
discovery_secs: 10
mx: 2
http_timeout_secs: 8
poll_interval_ms: 2000
bind_port: 8099
local_ip: 192.168.1.20
";
        let config = Config::from_yaml_str(text).unwrap();
        assert_eq!(config.discovery_secs, 10);
        assert_eq!(config.mx, 2);
        assert_eq!(config.http_timeout_secs, 8);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.bind_port, 8099);
        assert_eq!(config.local_ip.as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(Config::from_yaml_str("discovery_secs: [oops").is_err());
    }

    // The only test mutating the environment (tests run in parallel).
    #[test]
    fn env_overrides_patch_and_validate() {
        unsafe {
            env::set_var("PMOCAST_MX", "4");
            env::set_var("PMOCAST_LOCAL_IP", "10.0.0.7");
            env::set_var("PMOCAST_POLL_INTERVAL_MS", "not-a-number");
        }
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.mx, 4);
        assert_eq!(config.local_ip.as_deref(), Some("10.0.0.7"));
        // Invalid values are logged and skipped.
        assert_eq!(config.poll_interval_ms, 1500);

        unsafe {
            env::set_var("PMOCAST_LOCAL_IP", "");
        }
        config.apply_env_overrides();
        assert!(config.local_ip.is_none());

        unsafe {
            env::remove_var("PMOCAST_MX");
            env::remove_var("PMOCAST_LOCAL_IP");
            env::remove_var("PMOCAST_POLL_INTERVAL_MS");
        }
    }

    #[test]
    fn durations_derive_from_fields() {
        let config = Config {
            poll_interval_ms: 250,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.discovery_timeout(), Duration::from_secs(5));
    }
}
