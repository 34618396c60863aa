//! Matcher configuration from environment variables

use std::env;

/// Configuration for trigger loading and window matching
///
/// Environment variables:
/// - `TRIGGER_PATTERN` (required) - named-capture regex applied to trigger-file lines
/// - `TRIGGER_FORMAT` (required) - chrono format string for the timestamp capture
/// - `TRIGGER_PATH` (default: Triggers_*) - glob resolved under the event's directory
/// - `TRIGGER_TIMEZONE` (optional) - fixed offset such as +02:00; when unset the
///   value's own offset is used
/// - `TRIGGER_TIMESTAMP_ATTRIBUTE` (default: timestamp)
/// - `TRIGGER_TIMESPAN_ATTRIBUTE` (default: timespan)
/// - `TRIGGER_TIMESPAN_DEFAULT` (default: 60)
/// - `TRIGGER_CLEANUP_INTERVAL_SECS` (default: 10)
/// - `TRIGGER_DROP_ON_NO_MATCH` (default: false)
/// - `TRIGGER_ATTRIBUTE` (default: trigger) - event field holding matched triggers
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub trigger_pattern: String,
    pub trigger_format: String,
    pub trigger_path: String,
    pub timezone: Option<String>,
    pub timestamp_attribute: String,
    pub timespan_attribute: String,
    pub timespan_default: i64,
    pub cleanup_interval_secs: i64,
    pub drop_on_no_match: bool,
    pub trigger_attribute: String,
}

impl TriggerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let trigger_pattern = env::var("TRIGGER_PATTERN")
            .map_err(|_| ConfigError::MissingVar("TRIGGER_PATTERN"))?;
        let trigger_format = env::var("TRIGGER_FORMAT")
            .map_err(|_| ConfigError::MissingVar("TRIGGER_FORMAT"))?;

        Ok(Self {
            trigger_pattern,
            trigger_format,
            trigger_path: env::var("TRIGGER_PATH")
                .unwrap_or_else(|_| "Triggers_*".to_string()),
            timezone: env::var("TRIGGER_TIMEZONE").ok(),
            timestamp_attribute: env::var("TRIGGER_TIMESTAMP_ATTRIBUTE")
                .unwrap_or_else(|_| "timestamp".to_string()),
            timespan_attribute: env::var("TRIGGER_TIMESPAN_ATTRIBUTE")
                .unwrap_or_else(|_| "timespan".to_string()),
            timespan_default: env::var("TRIGGER_TIMESPAN_DEFAULT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            cleanup_interval_secs: env::var("TRIGGER_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            drop_on_no_match: env::var("TRIGGER_DROP_ON_NO_MATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            trigger_attribute: env::var("TRIGGER_ATTRIBUTE")
                .unwrap_or_else(|_| "trigger".to_string()),
        })
    }
}

/// Startup configuration failures. All of these abort initialization.
#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidPattern(String),
    InvalidTimezone(String),
    InvalidTableSpec(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(var) => write!(f, "{} must be set", var),
            ConfigError::InvalidPattern(e) => write!(f, "Invalid trigger pattern: {}", e),
            ConfigError::InvalidTimezone(tz) => write!(f, "Invalid timezone offset: {}", tz),
            ConfigError::InvalidTableSpec(spec) => write!(f, "Invalid table spec: {}", spec),
        }
    }
}

impl std::error::Error for ConfigError {}
