//! Event processing engine
//!
//! Runs each incoming event through the window matcher, then hands qualified
//! matches to the database writer. Events survive the pipeline unless the
//! matcher is configured to drop non-matching ones.

use crate::event::LogEvent;
use crate::matcher_core::{parse_timespan_lossy, MatchOutcome, WindowMatcher};
use crate::pipeline::db::{TriggerDbWriter, TriggerUpsert};
use std::sync::Arc;

pub struct TriggerPipeline {
    matcher: WindowMatcher,
    db_writer: Arc<dyn TriggerDbWriter>,
    filter_tags: Vec<String>,
    package_attribute: String,
    triggertime_attribute: String,
    timespan_attribute: String,
    deleted_tag: String,
}

impl TriggerPipeline {
    pub fn new(
        matcher: WindowMatcher,
        db_writer: Arc<dyn TriggerDbWriter>,
        filter_tags: Vec<String>,
        package_attribute: String,
        triggertime_attribute: String,
        timespan_attribute: String,
        deleted_tag: String,
    ) -> Self {
        Self {
            matcher,
            db_writer,
            filter_tags,
            package_attribute,
            triggertime_attribute,
            timespan_attribute,
            deleted_tag,
        }
    }

    /// Process one event. Returns None when the matcher dropped it,
    /// otherwise the event with any matched triggers attached. Only matched
    /// events reach the sink; pass-throughs flow downstream unpersisted.
    pub async fn process_event(&mut self, mut event: LogEvent) -> Option<LogEvent> {
        match self.matcher.process(&mut event) {
            MatchOutcome::Dropped => return None,
            MatchOutcome::PassedThrough => return Some(event),
            MatchOutcome::Matched(_) => {}
        }

        // Deleted events still flow downstream, they just never persist
        if event.has_tag(&self.deleted_tag) {
            return Some(event);
        }

        let package = match event.field_str(&self.package_attribute) {
            Some(p) => p.to_string(),
            None => return Some(event),
        };
        let triggertime = match event.field_str(&self.triggertime_attribute) {
            Some(t) => t.to_string(),
            None => return Some(event),
        };

        let timespan_secs = event
            .field_str(&self.timespan_attribute)
            .map(parse_timespan_lossy)
            .unwrap_or(0);

        let upsert = TriggerUpsert {
            timestamp: event.timestamp,
            triggertime,
            timespan_secs,
        };

        if let Err(e) = self
            .db_writer
            .record(&package, &upsert, &self.filter_tags)
            .await
        {
            log::warn!("Failed to persist trigger for package {}: {}", package, e);
        }

        Some(event)
    }
}
