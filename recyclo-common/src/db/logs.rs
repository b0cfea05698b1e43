//! Decision log storage
//!
//! Append-only per-user history. Rows are inserted one at a time and only
//! ever removed in bulk by their owner.

use crate::outcome::{normalize, NormalizedCategory};
use crate::summary::{window_start, Summary};
use crate::time::{day_start, format_timestamp, now, parse_timestamp};
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// History page size when the caller gives none
pub const DEFAULT_HISTORY_LIMIT: i64 = 200;

/// Largest history page
pub const MAX_HISTORY_LIMIT: i64 = 1000;

/// Clamp a requested page size to `1..=MAX_HISTORY_LIMIT`
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// Row to insert
#[derive(Debug, Clone)]
pub struct NewDecisionRecord {
    pub user_id: String,
    pub label: String,
    pub category: NormalizedCategory,
    pub confidence: f64,
    pub locale: String,
}

/// Stored row; `user_id` is implied by the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub id: i64,
    pub label: String,
    pub category: NormalizedCategory,
    pub confidence: Option<f64>,
    pub locale: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LogStore {
    pool: SqlitePool,
}

impl LogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert with the current time; returns the row id
    pub async fn insert(&self, record: &NewDecisionRecord) -> Result<i64> {
        self.insert_at(record, now()).await
    }

    pub async fn insert_at(&self, record: &NewDecisionRecord, created_at: DateTime<Utc>) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO decision_logs (user_id, label, category, confidence, locale, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.label)
        .bind(record.category.as_str())
        .bind(record.confidence)
        .bind(&record.locale)
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        debug!("Logged decision '{}' for user {}", record.label, record.user_id);
        Ok(result.last_insert_rowid())
    }

    /// Newest first
    pub async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<DecisionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, label, category, confidence, locale, created_at
            FROM decision_logs
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .iter()
            .map(|row| {
                let label: String = row.get("label");
                let category = row
                    .get::<Option<String>, _>("category")
                    .and_then(|name| NormalizedCategory::from_name(&name))
                    .unwrap_or_else(|| normalize(&label));
                DecisionRecord {
                    id: row.get("id"),
                    category,
                    confidence: row.get("confidence"),
                    locale: row.get("locale"),
                    created_at: row
                        .get::<Option<String>, _>("created_at")
                        .and_then(|raw| parse_timestamp(&raw)),
                    label,
                }
            })
            .collect();

        Ok(records)
    }

    /// (label, count) over the user's whole history
    pub async fn label_counts(&self, user_id: &str) -> Result<Vec<(String, u64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT label, COUNT(*) FROM decision_logs WHERE user_id = ? GROUP BY label",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| (label, count.max(0) as u64))
            .collect())
    }

    /// (label, timestamp) of rows created on or after `start` (UTC midnight)
    pub async fn since(&self, user_id: &str, start: NaiveDate) -> Result<Vec<(String, DateTime<Utc>)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT label, created_at FROM decision_logs WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(day_start(start))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(label, raw)| parse_timestamp(&raw).map(|ts| (label, ts)))
            .collect())
    }

    /// Remove every row of `user_id`; returns the number deleted
    pub async fn delete_all(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM decision_logs WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Totals plus the window ending on `today`
    pub async fn summary(&self, user_id: &str, today: NaiveDate) -> Result<Summary> {
        let counts = self.label_counts(user_id).await?;
        let recent = self.since(user_id, window_start(today)).await?;

        Ok(Summary::build(
            counts.iter().map(|(label, count)| (label.as_str(), *count)),
            recent.iter().map(|(label, ts)| (label.as_str(), *ts)),
            today,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 200);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(5000)), 1000);
    }
}
