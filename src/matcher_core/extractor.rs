//! Named-capture pattern extraction
//!
//! The loader only depends on the `PatternExtractor` contract: given a text
//! line and a pattern configured at startup, return a mapping of named
//! captures to string values, or nothing when the line does not match.

use super::config::ConfigError;
use regex::Regex;
use std::collections::HashMap;

pub trait PatternExtractor: Send + Sync {
    /// Apply the pattern to one line. `None` means no match (not an error).
    fn extract(&self, line: &str) -> Option<HashMap<String, String>>;
}

/// Regex-backed extractor using named capture groups
pub struct RegexExtractor {
    pattern: Regex,
}

impl RegexExtractor {
    /// Compile the pattern. A pattern that does not compile aborts startup.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        Ok(Self { pattern })
    }
}

impl PatternExtractor for RegexExtractor {
    fn extract(&self, line: &str) -> Option<HashMap<String, String>> {
        let caps = self.pattern.captures(line)?;

        let mut fields = HashMap::new();
        for name in self.pattern.capture_names().flatten() {
            if let Some(value) = caps.name(name) {
                fields.insert(name.to_string(), value.as_str().to_string());
            }
        }
        Some(fields)
    }
}
