//! Schema synchronization
//!
//! Tables declare their expected columns in code; on startup any column the
//! database lacks is added with `ALTER TABLE ... ADD COLUMN`. This is how
//! databases written by older releases pick up new columns without a
//! hand-written migration.
//!
//! Only additions are automatic. Type or constraint differences are logged
//! and left alone: SQLite cannot change them without rebuilding the table.
//!
//! ```rust,ignore
//! pub struct DecisionLogsTableSchema;
//!
//! impl TableSchema for DecisionLogsTableSchema {
//!     fn table_name() -> &'static str { "decision_logs" }
//!
//!     fn expected_columns() -> Vec<ColumnDefinition> {
//!         vec![
//!             ColumnDefinition::new("id", "INTEGER").primary_key(),
//!             ColumnDefinition::new("locale", "TEXT"),
//!         ]
//!     }
//! }
//!
//! SchemaSync::sync_table::<DecisionLogsTableSchema>(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Expected column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Declared SQL type ("TEXT", "INTEGER", "REAL")
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// SQL literal, e.g. `'default'` or `0`
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Clause for `ALTER TABLE ... ADD COLUMN`.
    ///
    /// SQLite refuses PRIMARY KEY here and only accepts NOT NULL together
    /// with a default, so those constraints are dropped when they cannot be
    /// honored.
    fn add_column_clause(&self) -> String {
        let mut clause = format!("{} {}", self.name, self.sql_type);
        match (&self.default_value, self.not_null) {
            (Some(default), true) => clause.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => clause.push_str(&format!(" DEFAULT {}", default)),
            (None, _) => {}
        }
        clause
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between declared and actual schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDrift {
    /// Fixable with ADD COLUMN
    MissingColumn { table: String, column: ColumnDefinition },
    /// Different type affinity; needs a manual rebuild
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
}

/// Declared schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Columns in creation order
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// SQLite type affinity (section 3.1 of the SQLite datatype docs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

fn affinity(sql_type: &str) -> Affinity {
    let t = sql_type.to_uppercase();
    if t.contains("INT") {
        Affinity::Integer
    } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
        Affinity::Text
    } else if t.is_empty() || t.contains("BLOB") {
        Affinity::Blob
    } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
        Affinity::Real
    } else {
        Affinity::Numeric
    }
}

/// Read-only schema queries
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Columns ordered by position
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        // PRAGMA arguments cannot be bound; table names come from TableSchema impls only
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
            .fetch_all(pool)
            .await?;

        let mut columns = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i64, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i64, _>("pk") != 0,
            })
            .collect::<Vec<_>>();
        columns.sort_by_key(|c| c.cid);

        Ok(columns)
    }
}

/// Expected-vs-actual comparison
pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(table_name: &str, expected: &[ColumnDefinition], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
        expected
            .iter()
            .filter_map(|want| {
                let found = actual.iter().find(|c| c.name.eq_ignore_ascii_case(&want.name));
                match found {
                    None => Some(SchemaDrift::MissingColumn {
                        table: table_name.to_string(),
                        column: want.clone(),
                    }),
                    Some(have) if affinity(&want.sql_type) != affinity(&have.type_name) => {
                        Some(SchemaDrift::TypeMismatch {
                            table: table_name.to_string(),
                            column: want.name.clone(),
                            expected: want.sql_type.clone(),
                            actual: have.type_name.clone(),
                        })
                    }
                    Some(_) => None,
                }
            })
            .collect()
    }
}

/// Applies drift fixes
pub struct SchemaSync;

impl SchemaSync {
    /// Add missing columns to `T`'s table; returns the names added.
    ///
    /// A table that does not exist yet is skipped: creation belongs to
    /// `CREATE TABLE IF NOT EXISTS` in `init`.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<Vec<String>> {
        let table_name = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            warn!("Schema sync: table '{}' does not exist, skipping", table_name);
            return Ok(Vec::new());
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            debug!("Schema sync: '{}' up to date", table_name);
            return Ok(Vec::new());
        }

        let mut added = Vec::new();
        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    if Self::add_column(pool, &table, &column).await? {
                        added.push(column.name);
                    }
                }
                SchemaDrift::TypeMismatch {
                    table,
                    column,
                    expected,
                    actual,
                } => {
                    warn!(
                        "Schema sync: {}.{} declared '{}' but database has '{}'; leaving as is",
                        table, column, expected, actual
                    );
                }
            }
        }

        Ok(added)
    }

    /// Returns false when another connection added the column first
    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<bool> {
        if column.primary_key {
            warn!(
                "Schema sync: {}.{} added without PRIMARY KEY (unsupported by ALTER TABLE)",
                table, column.name
            );
        }
        if column.not_null && column.default_value.is_none() {
            warn!(
                "Schema sync: {}.{} added as nullable (NOT NULL needs a default)",
                table, column.name
            );
        }

        let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, column.add_column_clause());
        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => {
                info!("Schema sync: added column {}.{} ({})", table, column.name, column.sql_type);
                Ok(true)
            }
            Err(sqlx::Error::Database(e)) if e.message().contains("duplicate column") => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
