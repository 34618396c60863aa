//! Trigger file loading - glob resolution and line parsing
//!
//! Trigger files are written into the watched directory by an external
//! producer at unpredictable times. Each file holds plain-text lines; lines
//! matching the configured pattern yield one `TriggerRecord` each. Lines
//! that fail extraction or timestamp parsing are skipped, never fatal.

use super::config::{ConfigError, TriggerConfig};
use super::extractor::{PatternExtractor, RegexExtractor};
use super::trigger::{parse_timespan_lossy, TriggerRecord};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct TriggerFileLoader {
    glob_pattern: String,
    extractor: Box<dyn PatternExtractor>,
    timestamp_attribute: String,
    timespan_attribute: String,
    timestamp_format: String,
    timezone: Option<FixedOffset>,
    timespan_default: i64,
}

impl TriggerFileLoader {
    /// Build a loader from configuration. Compiling the pattern or parsing
    /// the timezone offset can fail; both abort startup.
    pub fn from_config(config: &TriggerConfig) -> Result<Self, ConfigError> {
        let extractor = RegexExtractor::new(&config.trigger_pattern)?;

        let timezone = match &config.timezone {
            Some(raw) => Some(
                raw.parse::<FixedOffset>()
                    .map_err(|_| ConfigError::InvalidTimezone(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            glob_pattern: config.trigger_path.clone(),
            extractor: Box::new(extractor),
            timestamp_attribute: config.timestamp_attribute.clone(),
            timespan_attribute: config.timespan_attribute.clone(),
            timestamp_format: config.trigger_format.clone(),
            timezone,
            timespan_default: config.timespan_default,
        })
    }

    /// Load all trigger records found under `dir`.
    ///
    /// No matching files yields an empty vec. Records are accumulated across
    /// files in glob order, value-deduplicated.
    pub fn load(&self, dir: &Path) -> Vec<TriggerRecord> {
        let pattern = dir.join(&self.glob_pattern);
        let pattern = pattern.to_string_lossy();

        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                log::warn!("Bad trigger glob {}: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for path in paths.flatten() {
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    log::warn!("Could not read trigger file {}: {}", path.display(), e);
                    continue;
                }
            };

            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Non-matching lines are expected noise, not errors
                let Some(fields) = self.extractor.extract(line) else {
                    continue;
                };

                match self.record_from_fields(&fields) {
                    Ok(record) => {
                        if !records.contains(&record) {
                            log::debug!(
                                "Loaded trigger {} ±{}s from {}",
                                record.timestamp,
                                record.timespan_secs,
                                path.display()
                            );
                            records.push(record);
                        }
                    }
                    Err(e) => {
                        log::warn!("Skipping trigger line in {}: {}", path.display(), e);
                    }
                }
            }
        }

        records
    }

    fn record_from_fields(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<TriggerRecord, String> {
        let raw_timestamp = fields
            .get(&self.timestamp_attribute)
            .ok_or_else(|| format!("missing capture field {}", self.timestamp_attribute))?;

        let timestamp = self.parse_timestamp(raw_timestamp)?;

        let timespan = match fields.get(&self.timespan_attribute) {
            Some(raw) => parse_timespan_lossy(raw),
            None => self.timespan_default,
        };

        Ok(TriggerRecord::new(timestamp, timespan))
    }

    /// Parse a trigger timestamp with the configured format.
    ///
    /// With a configured timezone the value is read as local time in that
    /// offset. Without one, the value's own offset wins; values with neither
    /// are taken as UTC. Formats without a year get the current year, like
    /// the upstream producers expect.
    fn parse_timestamp(&self, raw: &str) -> Result<DateTime<Utc>, String> {
        if let Some(tz) = self.timezone {
            let naive = self.parse_naive(raw)?;
            let local = tz
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| format!("ambiguous local time {}", raw))?;
            return Ok(local.with_timezone(&Utc));
        }

        if let Ok(dt) = DateTime::parse_from_str(raw, &self.timestamp_format) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive = self.parse_naive(raw)?;
        Ok(Utc.from_utc_datetime(&naive))
    }

    fn parse_naive(&self, raw: &str) -> Result<NaiveDateTime, String> {
        NaiveDateTime::parse_from_str(raw, &self.timestamp_format)
            .or_else(|_| {
                // Retry with the current year prefixed for year-less formats
                NaiveDateTime::parse_from_str(
                    &format!("{} {}", Utc::now().year(), raw),
                    &format!("%Y {}", self.timestamp_format),
                )
            })
            .map_err(|e| format!("unparseable timestamp {}: {}", raw, e))
    }
}
