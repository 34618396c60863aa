//! Pipeline configuration from environment variables
//!
//! Environment variables:
//! - TRIGFLOW_DB_PATH: sqlite database file (default: trigflow.db)
//! - EVENT_CHANNEL_BUFFER: ingestion channel capacity (default: 10000)
//! - FILTER_TYPES: comma-separated tags to file triggers under (required)
//! - TABLE_PACKAGES: packages table as name:singularize (default: packages:true)
//! - TABLE_TRIGGERS: triggers table (default: triggers:true)
//! - TABLE_FILTERS: filters table (default: filters:true)
//! - TABLE_ZOT: association table (default: markables:true)
//! - PACKAGE_ATTRIBUTE: event field holding the package title (default: package)
//! - TRIGGERTIME_ATTRIBUTE: event field holding the trigger time (default: triggertime)
//! - PERSIST_TIMESPAN_ATTRIBUTE: event field holding the window half-width (default: timespan)
//! - DELETED_TAG: events carrying this tag skip persistence (default: del)

use crate::matcher_core::ConfigError;
use super::schema::{TableSet, TableSpec};
use std::env;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub db_path: String,
    pub channel_buffer: usize,
    pub filter_types: Vec<String>,
    pub table_packages: TableSpec,
    pub table_triggers: TableSpec,
    pub table_filters: TableSpec,
    pub table_zot: TableSpec,
    pub package_attribute: String,
    pub triggertime_attribute: String,
    pub timespan_attribute: String,
    pub deleted_tag: String,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let filter_types: Vec<String> = env::var("FILTER_TYPES")
            .map_err(|_| ConfigError::MissingVar("FILTER_TYPES"))?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            db_path: env::var("TRIGFLOW_DB_PATH").unwrap_or_else(|_| "trigflow.db".to_string()),
            channel_buffer: env::var("EVENT_CHANNEL_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            filter_types,
            table_packages: table_from_env("TABLE_PACKAGES", "packages", true)?,
            table_triggers: table_from_env("TABLE_TRIGGERS", "triggers", true)?,
            table_filters: table_from_env("TABLE_FILTERS", "filters", true)?,
            table_zot: table_from_env("TABLE_ZOT", "markables", true)?,
            package_attribute: env::var("PACKAGE_ATTRIBUTE")
                .unwrap_or_else(|_| "package".to_string()),
            triggertime_attribute: env::var("TRIGGERTIME_ATTRIBUTE")
                .unwrap_or_else(|_| "triggertime".to_string()),
            timespan_attribute: env::var("PERSIST_TIMESPAN_ATTRIBUTE")
                .unwrap_or_else(|_| "timespan".to_string()),
            deleted_tag: env::var("DELETED_TAG").unwrap_or_else(|_| "del".to_string()),
        })
    }

    pub fn table_set(&self) -> TableSet {
        TableSet {
            packages: self.table_packages.clone(),
            triggers: self.table_triggers.clone(),
            filters: self.table_filters.clone(),
            zot: self.table_zot.clone(),
        }
    }
}

fn table_from_env(
    var: &str,
    default_name: &str,
    default_singularize: bool,
) -> Result<TableSpec, ConfigError> {
    match env::var(var) {
        Ok(raw) => TableSpec::parse(&raw),
        Err(_) => Ok(TableSpec::new(default_name, default_singularize)),
    }
}
