//! Table metadata and foreign-key naming
//!
//! Table names come from configuration; the store's schema (a Rails-style
//! app database) names foreign keys after the singular of the referenced
//! table, so each table spec carries a singularization flag.

use crate::matcher_core::config::ConfigError;
use rusqlite::Connection;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub singularize: bool,
}

impl TableSpec {
    pub fn new(name: &str, singularize: bool) -> Self {
        Self {
            name: name.to_string(),
            singularize,
        }
    }

    /// Parse a `name:singularize` pair, e.g. `packages:true`
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (name, flag) = spec
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidTableSpec(spec.to_string()))?;
        if name.is_empty() {
            return Err(ConfigError::InvalidTableSpec(spec.to_string()));
        }
        let singularize = flag
            .parse()
            .map_err(|_| ConfigError::InvalidTableSpec(spec.to_string()))?;
        Ok(Self::new(name, singularize))
    }

    /// Generated foreign-key column name: the table name with its trailing
    /// character stripped when singularization is on, plus `_id`.
    /// `packages` → `package_id`; without the flag, `packages_id`.
    pub fn foreign_key(&self) -> String {
        if self.singularize {
            let mut name = self.name.clone();
            name.pop();
            format!("{}_id", name)
        } else {
            format!("{}_id", self.name)
        }
    }
}

/// The four tables the sink writes
#[derive(Debug, Clone)]
pub struct TableSet {
    pub packages: TableSpec,
    pub triggers: TableSpec,
    pub filters: TableSpec,
    pub zot: TableSpec,
}

impl Default for TableSet {
    fn default() -> Self {
        Self {
            packages: TableSpec::new("packages", true),
            triggers: TableSpec::new("triggers", true),
            filters: TableSpec::new("filters", true),
            zot: TableSpec::new("markables", true),
        }
    }
}

impl TableSet {
    /// Verify that every configured table exists in the database.
    ///
    /// A missing table is fatal at startup - the sink never creates schema.
    pub fn check_tables(&self, conn: &Connection) -> Result<(), Vec<String>> {
        let existing = match all_table_names(conn) {
            Ok(existing) => existing,
            Err(e) => return Err(vec![format!("could not list tables: {}", e)]),
        };

        let missing: Vec<String> = [&self.packages, &self.triggers, &self.filters, &self.zot]
            .iter()
            .filter(|spec| !existing.contains(&spec.name))
            .map(|spec| spec.name.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

fn all_table_names(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(names)
}
