//! Event pipeline: ingestion, matching, and SQLite persistence
//!
//! Data flow:
//!
//! ```text
//!   events ──> mpsc channel ──> TriggerPipeline ──> PackagedSqliteWriter
//!                                    │                      │
//!                              WindowMatcher          packages/triggers/
//!                             (matcher_core)          filters/markables
//! ```
//!
//! The ingestion task drains the channel, runs each event through the
//! matcher, and persists qualifying trigger records. Surviving events are
//! optionally forwarded to an output channel.

pub mod config;
pub mod db;
pub mod engine;
pub mod ingestion;
pub mod schema;

pub use config::PipelineConfig;
pub use db::{DbWriterError, PackagedSqliteWriter, TriggerDbWriter, TriggerUpsert};
pub use engine::TriggerPipeline;
pub use ingestion::start_event_ingestion;
pub use schema::{TableSet, TableSpec};
