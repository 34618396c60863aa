//! Window matching against cached triggers

use super::cache::DirectoryTriggerCache;
use crate::event::LogEvent;
use serde_json::Value;

/// Result of running one event through the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// At least one trigger window contained the event timestamp
    Matched(usize),
    /// No window matched; event continues unchanged
    PassedThrough,
    /// No window matched and drop-on-no-match is enabled; event is suppressed
    Dropped,
}

pub struct WindowMatcher {
    cache: DirectoryTriggerCache,
    trigger_attribute: String,
    drop_on_no_match: bool,
}

impl WindowMatcher {
    pub fn new(
        cache: DirectoryTriggerCache,
        trigger_attribute: String,
        drop_on_no_match: bool,
    ) -> Self {
        Self {
            cache,
            trigger_attribute,
            drop_on_no_match,
        }
    }

    /// Match one event against the triggers of its directory.
    ///
    /// Sweeps and touches the cache first, so eviction runs on the event
    /// path. Matching triggers are appended to the event's trigger attribute
    /// in cache order, skipping values already present. The match count
    /// includes triggers that were already attached.
    pub fn process(&mut self, event: &mut LogEvent) -> MatchOutcome {
        let dir = event.dirname();

        self.cache.sweep();
        self.cache.touch(&dir);

        let triggers = self.cache.get_or_load(&dir).to_vec();

        let mut matches = 0;
        for trigger in &triggers {
            if !trigger.contains(event.timestamp) {
                continue;
            }
            matches += 1;

            let value = match serde_json::to_value(trigger) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Could not serialize trigger: {}", e);
                    continue;
                }
            };

            let attached = event
                .fields
                .entry(self.trigger_attribute.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = attached {
                if !list.contains(&value) {
                    list.push(value);
                }
            }
        }

        if matches > 0 {
            MatchOutcome::Matched(matches)
        } else if self.drop_on_no_match {
            log::debug!("trigger: dropping event, no matches");
            MatchOutcome::Dropped
        } else {
            log::debug!("trigger: no matches, but drop disabled");
            MatchOutcome::PassedThrough
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher_core::config::TriggerConfig;
    use crate::matcher_core::loader::TriggerFileLoader;
    use chrono::{TimeZone, Utc};
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_matcher(drop_on_no_match: bool) -> WindowMatcher {
        let config = TriggerConfig {
            trigger_pattern: r"ts=(?P<timestamp>\S+) span=(?P<timespan>\d+)".to_string(),
            trigger_format: "%Y-%m-%dT%H:%M:%S%z".to_string(),
            trigger_path: "Triggers_*".to_string(),
            timezone: None,
            timestamp_attribute: "timestamp".to_string(),
            timespan_attribute: "timespan".to_string(),
            timespan_default: 60,
            cleanup_interval_secs: 10,
            drop_on_no_match,
            trigger_attribute: "trigger".to_string(),
        };
        let loader = TriggerFileLoader::from_config(&config).unwrap();
        let cache = DirectoryTriggerCache::new(loader, config.cleanup_interval_secs);
        WindowMatcher::new(cache, config.trigger_attribute, config.drop_on_no_match)
    }

    fn write_trigger_file(dir: &Path, line: &str) {
        let mut file = File::create(dir.join("Triggers_test")).unwrap();
        writeln!(file, "{}", line).unwrap();
    }

    fn event_at(dir: &Path, secs_utc: i64) -> LogEvent {
        LogEvent::new(
            Utc.timestamp_opt(secs_utc, 0).unwrap(),
            &dir.join("a.log").to_string_lossy(),
        )
    }

    #[test]
    fn test_event_inside_window_matches() {
        // Trigger at 2024-01-01T00:00:00Z ±60s
        let dir = TempDir::new().unwrap();
        write_trigger_file(dir.path(), "ts=2024-01-01T00:00:00+0000 span=60");

        let mut matcher = test_matcher(false);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp();

        let mut inside = event_at(dir.path(), base + 30);
        assert_eq!(matcher.process(&mut inside), MatchOutcome::Matched(1));
        let attached = inside.fields.get("trigger").unwrap().as_array().unwrap();
        assert_eq!(attached.len(), 1);

        let mut outside = event_at(dir.path(), base + 121);
        assert_eq!(matcher.process(&mut outside), MatchOutcome::PassedThrough);
        assert!(outside.fields.get("trigger").is_none());
    }

    #[test]
    fn test_boundary_timestamps_match() {
        let dir = TempDir::new().unwrap();
        write_trigger_file(dir.path(), "ts=2024-01-01T00:00:00+0000 span=60");

        let mut matcher = test_matcher(false);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp();

        let mut at_start = event_at(dir.path(), base - 60);
        assert_eq!(matcher.process(&mut at_start), MatchOutcome::Matched(1));

        let mut at_end = event_at(dir.path(), base + 60);
        assert_eq!(matcher.process(&mut at_end), MatchOutcome::Matched(1));
    }

    #[test]
    fn test_drop_on_no_match_suppresses_event() {
        // No trigger files at all, drop enabled
        let dir = TempDir::new().unwrap();

        let mut matcher = test_matcher(true);
        let mut event = event_at(dir.path(), 1_700_000_000);

        assert_eq!(matcher.process(&mut event), MatchOutcome::Dropped);
    }

    #[test]
    fn test_multiple_windows_all_attached() {
        let dir = TempDir::new().unwrap();
        let mut file = File::create(dir.path().join("Triggers_test")).unwrap();
        writeln!(file, "ts=2024-01-01T00:00:00+0000 span=60").unwrap();
        writeln!(file, "ts=2024-01-01T00:00:30+0000 span=60").unwrap();
        writeln!(file, "ts=2024-01-01T06:00:00+0000 span=60").unwrap();

        let mut matcher = test_matcher(false);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp();

        let mut event = event_at(dir.path(), base + 30);
        assert_eq!(matcher.process(&mut event), MatchOutcome::Matched(2));

        let attached = event.fields.get("trigger").unwrap().as_array().unwrap();
        assert_eq!(attached.len(), 2);
    }

    #[test]
    fn test_already_attached_trigger_not_duplicated() {
        let dir = TempDir::new().unwrap();
        write_trigger_file(dir.path(), "ts=2024-01-01T00:00:00+0000 span=60");

        let mut matcher = test_matcher(false);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp();

        let mut event = event_at(dir.path(), base);
        assert_eq!(matcher.process(&mut event), MatchOutcome::Matched(1));
        // Second pass still counts the match but must not re-attach
        assert_eq!(matcher.process(&mut event), MatchOutcome::Matched(1));

        let attached = event.fields.get("trigger").unwrap().as_array().unwrap();
        assert_eq!(attached.len(), 1);
    }
}
