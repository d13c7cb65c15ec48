//! SDK options bag.
//!
//! Every client carries one [`SdkOptions`] value. Options come from code
//! (builder methods), from the `defaults` section of a connections file, or
//! from a per-context `options` override, merged in that order:
//!
//! ```yaml
//! defaults:
//!   log_level: info
//!   max_redirects: 5
//! contexts:
//!   - name: prod
//!     server: https://kinetic.example.com
//!     options:
//!       gateway_retry_limit: 3
//!       gateway_retry_delay: 2.5
//!       ssl_verify_mode: peer
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default number of redirect hops followed per request.
pub const DEFAULT_MAX_REDIRECTS: i32 = 5;

/// Default gateway retry limit (pass 502/503/504 straight through).
pub const DEFAULT_GATEWAY_RETRY_LIMIT: i32 = -1;

/// Default delay between gateway retries, in seconds.
pub const DEFAULT_GATEWAY_RETRY_DELAY: f64 = 1.0;

// ─────────────────────────────────────────────────────────────────────────────
// Enumerated options
// ─────────────────────────────────────────────────────────────────────────────

/// Verbosity of the SDK's own log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(ConfigError::InvalidOption {
                option: "log_level".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Stream the SDK logs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

impl std::str::FromStr for LogOutput {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            other => Err(ConfigError::InvalidOption {
                option: "log_output".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// TLS peer verification mode.
///
/// `None` is the default: certificates are not verified unless `Peer` is
/// requested explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslVerifyMode {
    #[default]
    None,
    Peer,
}

impl std::str::FromStr for SslVerifyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SslVerifyMode::None),
            "peer" => Ok(SslVerifyMode::Peer),
            other => Err(ConfigError::InvalidOption {
                option: "ssl_verify_mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved options for one SDK client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkOptions {
    pub log_level: LogLevel,
    pub log_output: LogOutput,
    /// Redirect hops per request: `-1` returns redirects untouched, `0`
    /// treats any redirect as an error.
    pub max_redirects: i32,
    /// Retries for 502/503/504: `-1` returns those responses untouched,
    /// `0` treats them as fatal.
    pub gateway_retry_limit: i32,
    /// Seconds to wait between gateway retries.
    pub gateway_retry_delay: f64,
    pub ssl_verify_mode: SslVerifyMode,
    pub ssl_ca_file: Option<PathBuf>,
    /// Root directory for export/import operations.
    pub export_directory: Option<PathBuf>,
}

impl Default for SdkOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_output: LogOutput::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            gateway_retry_limit: DEFAULT_GATEWAY_RETRY_LIMIT,
            gateway_retry_delay: DEFAULT_GATEWAY_RETRY_DELAY,
            ssl_verify_mode: SslVerifyMode::default(),
            ssl_ca_file: None,
            export_directory: None,
        }
    }
}

impl SdkOptions {
    /// Gateway retry delay as a [`Duration`]; negative or NaN values
    /// collapse to zero, values too large to represent saturate.
    pub fn gateway_retry_delay(&self) -> Duration {
        if self.gateway_retry_delay > 0.0 {
            Duration::try_from_secs_f64(self.gateway_retry_delay).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// The export directory, or a configuration error naming the operation
    /// that needed it.
    pub fn require_export_directory(&self, operation: &str) -> Result<&PathBuf> {
        self.export_directory
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "export_directory".to_string(),
                context: operation.to_string(),
            })
    }

    /// Apply a partial override on top of these options.
    pub fn merged(mut self, overrides: &OptionsOverride) -> Self {
        if let Some(v) = overrides.log_level {
            self.log_level = v;
        }
        if let Some(v) = overrides.log_output {
            self.log_output = v;
        }
        if let Some(v) = overrides.max_redirects {
            self.max_redirects = v;
        }
        if let Some(v) = overrides.gateway_retry_limit {
            self.gateway_retry_limit = v;
        }
        if let Some(v) = overrides.gateway_retry_delay {
            self.gateway_retry_delay = v;
        }
        if let Some(v) = overrides.ssl_verify_mode {
            self.ssl_verify_mode = v;
        }
        if let Some(v) = &overrides.ssl_ca_file {
            self.ssl_ca_file = Some(v.clone());
        }
        if let Some(v) = &overrides.export_directory {
            self.export_directory = Some(v.clone());
        }
        self
    }
}

/// Partial options, as written in a context's `options` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_output: Option<LogOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redirects: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_retry_limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_retry_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify_mode: Option<SslVerifyMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_ca_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_directory: Option<PathBuf>,
}
