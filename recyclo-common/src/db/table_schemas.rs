//! Declared table schemas
//!
//! `CREATE TABLE` statements in `init` and the column lists here must agree;
//! new columns are added here and picked up by existing databases on the
//! next start.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// One row per classification attempt by a signed-in user
pub struct DecisionLogsTableSchema;

impl TableSchema for DecisionLogsTableSchema {
    fn table_name() -> &'static str {
        "decision_logs"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("user_id", "TEXT").not_null(),
            // Action as shown to the user ("Drop-off", "Unsure", ...)
            ColumnDefinition::new("label", "TEXT").not_null(),
            // Added after the first release; NULL on legacy rows until backfilled
            ColumnDefinition::new("category", "TEXT"),
            ColumnDefinition::new("confidence", "REAL"),
            ColumnDefinition::new("locale", "TEXT"),
            // Fixed-width RFC 3339, see crate::time
            ColumnDefinition::new("created_at", "TEXT").not_null(),
        ]
    }
}

/// Add missing columns to every declared table
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    let added = SchemaSync::sync_table::<DecisionLogsTableSchema>(pool).await?;
    if !added.is_empty() {
        info!("decision_logs: added columns {:?}", added);
    }
    Ok(())
}
