//! Packaged trigger persistence into SQLite
//!
//! Upserts Package → Trigger → Filter → Association rows into an existing
//! Rails-style schema. Every step is a natural-key lookup before insert, so
//! repeated receipt of the same logical input resolves to the same surrogate
//! ids and never duplicates rows. Row failures are logged and recovered
//! locally - there is no cross-table transaction, this sink is best-effort.

use super::schema::TableSet;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, ToSql};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub enum DbWriterError {
    Database(String),
    TableNotFound(String),
}

impl From<rusqlite::Error> for DbWriterError {
    fn from(err: rusqlite::Error) -> Self {
        DbWriterError::Database(err.to_string())
    }
}

impl std::fmt::Display for DbWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbWriterError::Database(e) => write!(f, "Database error: {}", e),
            DbWriterError::TableNotFound(t) => write!(f, "Could not find table {} in db", t),
        }
    }
}

impl std::error::Error for DbWriterError {}

/// Trigger data extracted from one qualifying event
#[derive(Debug, Clone)]
pub struct TriggerUpsert {
    /// Event timestamp, center of the persisted window
    pub timestamp: DateTime<Utc>,
    /// Raw trigger-time field, becomes part of the trigger name
    pub triggertime: String,
    pub timespan_secs: i64,
}

/// Trait for persisting matched-trigger records
#[async_trait]
pub trait TriggerDbWriter: Send + Sync {
    /// Upsert the package, its trigger window, and one filter + association
    /// per tag (position = tag index). Idempotent under repeated input.
    async fn record(
        &self,
        package_title: &str,
        trigger: &TriggerUpsert,
        filter_tags: &[String],
    ) -> Result<(), DbWriterError>;
}

/// SQLite implementation of TriggerDbWriter
pub struct PackagedSqliteWriter {
    conn: Arc<Mutex<Connection>>,
    tables: TableSet,
}

impl PackagedSqliteWriter {
    /// Open the database and verify the configured tables exist.
    ///
    /// The schema belongs to the downstream application; a missing table is
    /// fatal at startup, never created here.
    pub fn new(db_path: &str, tables: TableSet) -> Result<Self, DbWriterError> {
        let conn = Connection::open(db_path)?;

        if let Err(missing) = tables.check_tables(&conn) {
            return Err(DbWriterError::TableNotFound(missing.join(", ")));
        }

        log::info!("Registered sqlite sink, database {}", db_path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            tables,
        })
    }

    fn insert_package(&self, conn: &Connection, title: &str) -> Option<i64> {
        let title = normalize(title);
        let now = rails_format(Utc::now());

        let result = upsert_row(
            conn,
            &self.tables.packages.name,
            "title = ?",
            &[&title],
            &["title", "created_at", "updated_at"],
            &[&title, &now, &now],
        );

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not write to package: {}", e);
                None
            }
        }
    }

    fn insert_trigger(
        &self,
        conn: &Connection,
        trigger: &TriggerUpsert,
        package_id: i64,
    ) -> Option<i64> {
        let name = normalize(&format!("trigger_{}", trigger.triggertime));
        let now = rails_format(Utc::now());

        let start_time = trigger.timestamp - Duration::seconds(trigger.timespan_secs);
        // Stored windows are half-open: the end bound backs off 1 ms so
        // adjacent windows never overlap at table-bound resolution. The live
        // matcher stays inclusive at both ends.
        let end_time = trigger.timestamp + Duration::seconds(trigger.timespan_secs)
            - Duration::milliseconds(1);

        let package_fk = self.tables.packages.foreign_key();
        let predicate = format!("name = ? AND {} = ?", package_fk);
        let from = rails_format(start_time);
        let to = rails_format(end_time);

        let result = upsert_row(
            conn,
            &self.tables.triggers.name,
            &predicate,
            &[&name, &package_id],
            &[
                "name",
                "\"from\"",
                "\"to\"",
                package_fk.as_str(),
                "created_at",
                "updated_at",
            ],
            &[&name, &from, &to, &package_id, &now, &now],
        );

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not write to trigger: {}", e);
                None
            }
        }
    }

    fn insert_filter(&self, conn: &Connection, package_id: i64, tag: &str) -> Option<i64> {
        let name = format!("{} *", tag);
        let query = "*";
        let now = rails_format(Utc::now());

        let package_fk = self.tables.packages.foreign_key();
        let predicate = format!("name = ? AND {} = ?", package_fk);

        let result = upsert_row(
            conn,
            &self.tables.filters.name,
            &predicate,
            &[&name, &package_id],
            &[
                package_fk.as_str(),
                "name",
                "query",
                "tags",
                "created_at",
                "updated_at",
            ],
            &[&package_id, &name, &query, &tag, &now, &now],
        );

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not write to filter: {}", e);
                None
            }
        }
    }

    fn insert_zot(
        &self,
        conn: &Connection,
        filter_id: i64,
        trigger_id: i64,
        position: i64,
    ) -> Option<i64> {
        let now = rails_format(Utc::now());

        let filter_fk = self.tables.filters.foreign_key();
        let trigger_fk = self.tables.triggers.foreign_key();
        let predicate = format!("{} = ? AND {} = ?", filter_fk, trigger_fk);

        let result = upsert_row(
            conn,
            &self.tables.zot.name,
            &predicate,
            &[&filter_id, &trigger_id],
            &[
                filter_fk.as_str(),
                trigger_fk.as_str(),
                "position",
                "created_at",
                "updated_at",
            ],
            &[&filter_id, &trigger_id, &position, &now, &now],
        );

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not write to zot: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl TriggerDbWriter for PackagedSqliteWriter {
    async fn record(
        &self,
        package_title: &str,
        trigger: &TriggerUpsert,
        filter_tags: &[String],
    ) -> Result<(), DbWriterError> {
        let conn = self.conn.lock().unwrap();

        log::debug!("Trigger from package received, package {}", package_title);

        let Some(package_id) = self.insert_package(&conn, package_title) else {
            return Ok(());
        };
        let Some(trigger_id) = self.insert_trigger(&conn, trigger, package_id) else {
            return Ok(());
        };

        for (position, tag) in filter_tags.iter().enumerate() {
            if let Some(filter_id) = self.insert_filter(&conn, package_id, tag) {
                self.insert_zot(&conn, filter_id, trigger_id, position as i64);
            }
        }

        Ok(())
    }
}

/// Natural-key lookup before insert, shared by all four tables.
///
/// Returns the existing row's id when the predicate matches, otherwise
/// assigns `MAX(id) + 1` (1 on an empty table) and inserts. Single-writer
/// assumption: ids are never raced.
fn upsert_row(
    conn: &Connection,
    table: &str,
    key_predicate: &str,
    key_params: &[&dyn ToSql],
    columns: &[&str],
    values: &[&dyn ToSql],
) -> rusqlite::Result<i64> {
    let select = format!("SELECT id FROM {} WHERE {}", table, key_predicate);
    if let Some(id) = conn
        .query_row(&select, key_params, |row| row.get::<_, i64>(0))
        .optional()?
    {
        return Ok(id);
    }

    let next_id: i64 = conn.query_row(
        &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table),
        [],
        |row| row.get(0),
    )?;

    let placeholders = vec!["?"; columns.len()].join(", ");
    let insert = format!(
        "INSERT INTO {} (id, {}) VALUES (?, {})",
        table,
        columns.join(", "),
        placeholders
    );

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(values.len() + 1);
    params.push(&next_id);
    params.extend_from_slice(values);
    conn.execute(&insert, params.as_slice())?;

    Ok(next_id)
}

/// Rails timestamp format used by the downstream schema
fn rails_format(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn normalize(s: &str) -> String {
    s.replace('_', " ")
}
