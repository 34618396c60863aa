//! Event model - JSON-line events from upstream decoders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A single pipeline event.
///
/// Upstream decoders emit one JSON object per line; every key other than
/// `timestamp`, `path` and `tags` lands in `fields` unchanged. The window
/// matcher stores matched triggers inside `fields` under a configurable
/// attribute name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,

    /// Absolute path of the source file; its directory keys the trigger cache.
    pub path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(flatten, default)]
    pub fields: HashMap<String, Value>,
}

impl LogEvent {
    pub fn new(timestamp: DateTime<Utc>, path: &str) -> Self {
        Self {
            timestamp,
            path: path.to_string(),
            tags: Vec::new(),
            fields: HashMap::new(),
        }
    }

    /// Parse an event from a JSON line
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Directory component of the event path (cache key)
    pub fn dirname(&self) -> PathBuf {
        Path::new(&self.path)
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf()
    }

    /// String value of a field, if present and a string
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_json_line() {
        let line = r#"{"timestamp":"2024-01-01T00:00:30Z","path":"/logs/pkg/a.log","tags":["err"],"package":"Pkg_A","triggertime":"5"}"#;

        let event = LogEvent::from_json_line(line).unwrap();
        assert_eq!(event.path, "/logs/pkg/a.log");
        assert_eq!(event.dirname(), PathBuf::from("/logs/pkg"));
        assert!(event.has_tag("err"));
        assert!(!event.has_tag("warn"));
        assert_eq!(event.field_str("package"), Some("Pkg_A"));
        assert_eq!(event.field_str("triggertime"), Some("5"));
        assert_eq!(event.field_str("missing"), None);
    }

    #[test]
    fn test_malformed_event_line() {
        let line = r#"{"path": "no timestamp"#;
        assert!(LogEvent::from_json_line(line).is_err());
    }

    #[test]
    fn test_dirname_of_bare_filename() {
        let event = LogEvent::new(Utc::now(), "a.log");
        assert_eq!(event.dirname(), PathBuf::from(""));
    }
}
