
pub mod event;
pub mod matcher_core;
pub mod pipeline;

use {
    event::LogEvent,
    matcher_core::{DirectoryTriggerCache, TriggerConfig, TriggerFileLoader, WindowMatcher},
    pipeline::{
        start_event_ingestion, PackagedSqliteWriter, PipelineConfig, TriggerPipeline,
    },
    std::sync::Arc,
    tokio::io::{AsyncBufReadExt, BufReader},
    tokio::sync::mpsc,
};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let trigger_config = TriggerConfig::from_env()?;
    let pipeline_config = PipelineConfig::from_env()?;

    log::info!("🚀 Starting trigflow...");
    log::info!("📊 Configuration:");
    log::info!("   TRIGGER_PATH: {}", trigger_config.trigger_path);
    log::info!("   TRIGGER_FORMAT: {}", trigger_config.trigger_format);
    log::info!("   TRIGFLOW_DB_PATH: {}", pipeline_config.db_path);
    log::info!("   FILTER_TYPES: {:?}", pipeline_config.filter_types);

    let loader = TriggerFileLoader::from_config(&trigger_config)?;
    let cache = DirectoryTriggerCache::new(loader, trigger_config.cleanup_interval_secs);
    let matcher = WindowMatcher::new(
        cache,
        trigger_config.trigger_attribute.clone(),
        trigger_config.drop_on_no_match,
    );

    let db_writer = Arc::new(PackagedSqliteWriter::new(
        &pipeline_config.db_path,
        pipeline_config.table_set(),
    )?);

    let pipeline = TriggerPipeline::new(
        matcher,
        db_writer,
        pipeline_config.filter_types.clone(),
        pipeline_config.package_attribute.clone(),
        pipeline_config.triggertime_attribute.clone(),
        pipeline_config.timespan_attribute.clone(),
        pipeline_config.deleted_tag.clone(),
    );

    let (tx, rx) = mpsc::channel::<LogEvent>(pipeline_config.channel_buffer);
    let ingestion = tokio::spawn(start_event_ingestion(rx, pipeline, None));

    // Events arrive as JSON lines on stdin, one per line
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match LogEvent::from_json_line(&line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    log::warn!("Ingestion channel closed, stopping stdin reader");
                    break;
                }
            }
            Err(e) => log::warn!("Skipping malformed event line: {}", e),
        }
    }

    drop(tx);
    ingestion.await?;

    log::info!("✅ trigflow finished");
    Ok(())
}
