//! Event ingestion task
//!
//! Drains the event channel, runs each event through the pipeline, and
//! forwards survivors to an optional output channel. Logs throughput
//! every 10 seconds.

use crate::event::LogEvent;
use crate::pipeline::engine::TriggerPipeline;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub async fn start_event_ingestion(
    mut rx: mpsc::Receiver<LogEvent>,
    mut pipeline: TriggerPipeline,
    out_tx: Option<mpsc::Sender<LogEvent>>,
) {
    log::info!("🚀 Event ingestion started");

    let mut received: u64 = 0;
    let mut dropped: u64 = 0;
    let mut last_report = Instant::now();
    let report_interval = Duration::from_secs(10);

    while let Some(event) = rx.recv().await {
        received += 1;

        match pipeline.process_event(event).await {
            Some(event) => {
                if let Some(tx) = &out_tx {
                    if tx.send(event).await.is_err() {
                        log::warn!("Output channel closed, stopping ingestion");
                        break;
                    }
                }
            }
            None => dropped += 1,
        }

        if last_report.elapsed() >= report_interval {
            log::info!(
                "📊 Throughput: {} events received, {} dropped, queue depth {}",
                received,
                dropped,
                rx.len()
            );
            last_report = Instant::now();
        }
    }

    log::info!(
        "Event channel closed, ingestion finished ({} received, {} dropped)",
        received,
        dropped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher_core::{
        DirectoryTriggerCache, TriggerConfig, TriggerFileLoader, WindowMatcher,
    };
    use crate::pipeline::db::PackagedSqliteWriter;
    use crate::pipeline::schema::TableSet;
    use chrono::{TimeZone, Utc};
    use rusqlite::Connection;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use tempfile::{NamedTempFile, TempDir};

    fn build_pipeline(dir: &TempDir) -> (NamedTempFile, TriggerPipeline) {
        let config = TriggerConfig {
            trigger_pattern: r"^(?P<timestamp>\S+ \S+);(?P<timespan>\d+)$".to_string(),
            trigger_format: "%Y-%m-%d %H:%M:%S".to_string(),
            trigger_path: "Triggers_*".to_string(),
            timezone: None,
            timestamp_attribute: "timestamp".to_string(),
            timespan_attribute: "timespan".to_string(),
            timespan_default: 60,
            cleanup_interval_secs: 10,
            drop_on_no_match: true,
            trigger_attribute: "trigger".to_string(),
        };

        fs::write(
            dir.path().join("Triggers_app.txt"),
            "2024-01-01 00:01:00;60\n",
        )
        .unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let conn = Connection::open(db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE packages (id INTEGER PRIMARY KEY, title TEXT, created_at TEXT, updated_at TEXT);
            CREATE TABLE triggers (id INTEGER PRIMARY KEY, name TEXT, "from" TEXT, "to" TEXT,
                                   package_id INTEGER, created_at TEXT, updated_at TEXT);
            CREATE TABLE filters (id INTEGER PRIMARY KEY, package_id INTEGER, name TEXT, query TEXT,
                                  tags TEXT, created_at TEXT, updated_at TEXT);
            CREATE TABLE markables (id INTEGER PRIMARY KEY, filter_id INTEGER, trigger_id INTEGER,
                                    position INTEGER, created_at TEXT, updated_at TEXT);
            "#,
        )
        .unwrap();
        drop(conn);

        let writer = Arc::new(PackagedSqliteWriter::new(db_path, TableSet::default()).unwrap());
        let loader = TriggerFileLoader::from_config(&config).unwrap();
        let cache = DirectoryTriggerCache::new(loader, config.cleanup_interval_secs);
        let matcher = WindowMatcher::new(cache, "trigger".to_string(), true);

        let pipeline = TriggerPipeline::new(
            matcher,
            writer,
            vec!["err".to_string()],
            "package".to_string(),
            "triggertime".to_string(),
            "timespan".to_string(),
            "del".to_string(),
        );
        (temp_file, pipeline)
    }

    fn make_event(dir: &TempDir, hour: u32, minute: u32) -> LogEvent {
        let mut event = LogEvent::new(
            Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap(),
            dir.path().join("app.log").to_str().unwrap(),
        );
        event.set_field("package", json!("Pkg"));
        event.set_field("triggertime", json!("1"));
        event.set_field("timespan", json!("30"));
        event
    }

    #[tokio::test]
    async fn test_ingestion_forwards_survivors_and_drops_misses() {
        let dir = TempDir::new().unwrap();
        let (_db, pipeline) = build_pipeline(&dir);

        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let handle = tokio::spawn(start_event_ingestion(rx, pipeline, Some(out_tx)));

        // In window
        tx.send(make_event(&dir, 0, 1)).await.unwrap();
        // Far outside, gets dropped
        tx.send(make_event(&dir, 12, 0)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let survivor = out_rx.recv().await.unwrap();
        assert!(survivor.fields.contains_key("trigger"));
        assert!(out_rx.recv().await.is_none());
    }
}
