//! Panel configuration.
//!
//! [`PanelConfig`] is the single source of truth for all runtime settings.
//! It is resolved once at startup from three layers, highest precedence
//! first:
//!
//! 1. CLI flags / environment variables ([`Overrides`], filled in by `main`)
//! 2. an optional TOML config file ([`FileConfig`])
//! 3. built-in defaults
//!
//! Keeping the resolved configuration as a plain struct (no global state, no
//! environment reads below `main`) keeps the controller and the web layer
//! easy to construct in tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Resolved configuration ────────────────────────────────────────────────────

/// All runtime configuration for the panel service.
///
/// Build once at startup, then share cheaply (the controller clones it; the
/// fields are small).
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Host the HTTP listener binds to. `"0.0.0.0"` accepts connections from
    /// any interface; use `"127.0.0.1"` for local-only access.
    pub http_host: String,
    /// Port the HTTP listener binds to.
    pub http_port: u16,

    /// Receiver hostname or IP address.
    pub avr_host: String,
    /// Receiver control port.
    pub avr_port: u16,

    /// TCP connect timeout for the receiver.
    pub connect_timeout: Duration,
    /// How long to wait for a single reply line after sending a command.
    /// Most commands are answered within a few hundred milliseconds; no
    /// reply at all is also normal.
    pub reply_timeout: Duration,
    /// Pause between the commands of a multi-command macro.
    pub command_gap: Duration,
    /// How often the status poll runs while connected.
    pub poll_interval: Duration,

    /// Reconnect attempts beyond the first before giving up.
    pub max_retries: u32,
    /// Backoff delay after the first failed attempt; doubles per attempt.
    pub initial_retry_delay: Duration,
    /// Backoff ceiling.
    pub max_retry_delay: Duration,

    /// When set, no socket is opened: connects always succeed and commands
    /// are simulated against the state record. Lets the UI be exercised
    /// without a receiver on the network.
    pub debug_mode: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            avr_host: "192.168.1.100".to_string(),
            avr_port: 60128,
            connect_timeout: Duration::from_secs(5),
            reply_timeout: Duration::from_secs(1),
            command_gap: Duration::from_millis(500),
            poll_interval: Duration::from_secs(2),
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(5),
            debug_mode: false,
        }
    }
}

impl PanelConfig {
    /// `host:port` string for the HTTP listener.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// `host:port` string for the receiver.
    pub fn avr_addr(&self) -> String {
        format!("{}:{}", self.avr_host, self.avr_port)
    }

    /// Resolves the final configuration from CLI overrides and an optional
    /// config file. CLI wins over file, file wins over defaults.
    pub fn resolve(cli: Overrides, file: Option<&FileConfig>) -> Self {
        let defaults = Self::default();
        let file_web = file.map(|f| &f.web);
        let file_recv = file.map(|f| &f.receiver);
        let file_ctl = file.map(|f| &f.controller);

        Self {
            http_host: cli
                .http_host
                .or_else(|| file_web.and_then(|w| w.host.clone()))
                .unwrap_or(defaults.http_host),
            http_port: cli
                .http_port
                .or_else(|| file_web.and_then(|w| w.port))
                .unwrap_or(defaults.http_port),
            avr_host: cli
                .avr_host
                .or_else(|| file_recv.and_then(|r| r.host.clone()))
                .unwrap_or(defaults.avr_host),
            avr_port: cli
                .avr_port
                .or_else(|| file_recv.and_then(|r| r.port))
                .unwrap_or(defaults.avr_port),
            connect_timeout: cli
                .connect_timeout_secs
                .or_else(|| file_recv.and_then(|r| r.connect_timeout_secs))
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            reply_timeout: file_ctl
                .and_then(|c| c.reply_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.reply_timeout),
            command_gap: file_ctl
                .and_then(|c| c.command_gap_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.command_gap),
            poll_interval: cli
                .poll_interval_ms
                .or_else(|| file_ctl.and_then(|c| c.poll_interval_ms))
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_retries: file_ctl
                .and_then(|c| c.max_retries)
                .unwrap_or(defaults.max_retries),
            initial_retry_delay: defaults.initial_retry_delay,
            max_retry_delay: defaults.max_retry_delay,
            debug_mode: cli.debug || file_ctl.and_then(|c| c.debug).unwrap_or(false),
        }
    }
}

/// Settings supplied on the command line or via environment variables.
///
/// `None` means "not given"; `resolve` falls through to the config file and
/// then the built-in default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub http_host: Option<String>,
    pub http_port: Option<u16>,
    pub avr_host: Option<String>,
    pub avr_port: Option<u16>,
    pub connect_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub debug: bool,
}

// ── Config file schema ────────────────────────────────────────────────────────

/// On-disk TOML configuration.
///
/// Every field is optional; absent fields fall through to defaults:
///
/// ```toml
/// [web]
/// host = "127.0.0.1"
/// port = 8080
///
/// [receiver]
/// host = "192.168.1.42"
/// port = 23
///
/// [controller]
/// poll_interval_ms = 2000
/// max_retries = 5
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub web: WebSection,
    #[serde(default)]
    pub receiver: ReceiverSection,
    #[serde(default)]
    pub controller: ControllerSection,
}

/// `[web]` section: the HTTP listener.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[receiver]` section: how to reach the receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReceiverSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout_secs: Option<u64>,
}

/// `[controller]` section: timing and retry policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ControllerSection {
    pub reply_timeout_ms: Option<u64>,
    pub command_gap_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub debug: Option<bool>,
}

impl FileConfig {
    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] on malformed TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_http_addr() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.http_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_default_avr_addr() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.avr_addr(), "192.168.1.100:60128");
    }

    #[test]
    fn test_default_poll_interval_is_2s() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_default_retry_policy() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.initial_retry_delay, Duration::from_millis(500));
        assert_eq!(cfg.max_retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_resolve_with_no_inputs_is_default() {
        let cfg = PanelConfig::resolve(Overrides::default(), None);
        assert_eq!(cfg, PanelConfig::default());
    }

    #[test]
    fn test_cli_override_wins_over_default() {
        // Arrange
        let cli = Overrides {
            avr_host: Some("10.0.0.9".to_string()),
            avr_port: Some(23),
            ..Overrides::default()
        };

        // Act
        let cfg = PanelConfig::resolve(cli, None);

        // Assert
        assert_eq!(cfg.avr_addr(), "10.0.0.9:23");
    }

    #[test]
    fn test_file_fills_in_when_cli_absent() {
        let file: FileConfig = toml::from_str(
            r#"
            [receiver]
            host = "192.168.1.42"

            [controller]
            poll_interval_ms = 5000
            "#,
        )
        .unwrap();

        let cfg = PanelConfig::resolve(Overrides::default(), Some(&file));

        assert_eq!(cfg.avr_host, "192.168.1.42");
        // Port was absent from the file, so the default applies.
        assert_eq!(cfg.avr_port, 60128);
        assert_eq!(cfg.poll_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_cli_wins_over_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [receiver]
            host = "192.168.1.42"
            "#,
        )
        .unwrap();
        let cli = Overrides {
            avr_host: Some("10.1.1.1".to_string()),
            ..Overrides::default()
        };

        let cfg = PanelConfig::resolve(cli, Some(&file));

        assert_eq!(cfg.avr_host, "10.1.1.1");
    }

    #[test]
    fn test_debug_enabled_from_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [controller]
            debug = true
            "#,
        )
        .unwrap();
        let cfg = PanelConfig::resolve(Overrides::default(), Some(&file));
        assert!(cfg.debug_mode);
    }

    #[test]
    fn test_debug_flag_wins_regardless_of_file() {
        let cli = Overrides { debug: true, ..Overrides::default() };
        let cfg = PanelConfig::resolve(cli, None);
        assert!(cfg.debug_mode);
    }

    #[test]
    fn test_empty_file_parses_to_all_none() {
        let file: FileConfig = toml::from_str("").unwrap();
        assert_eq!(file, FileConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result: Result<FileConfig, _> = toml::from_str("[receiver\nhost =");
        assert!(result.is_err());
    }

    #[test]
    fn test_timing_sections_resolve_to_durations() {
        let file: FileConfig = toml::from_str(
            r#"
            [controller]
            reply_timeout_ms = 250
            command_gap_ms = 100
            "#,
        )
        .unwrap();

        let cfg = PanelConfig::resolve(Overrides::default(), Some(&file));

        assert_eq!(cfg.reply_timeout, Duration::from_millis(250));
        assert_eq!(cfg.command_gap, Duration::from_millis(100));
    }
}
