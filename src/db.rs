use anyhow::Result;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::str::FromStr;
use tracing::{debug, info};

use crate::types::EvaluationMetrics;
use crate::TARGET_DB;

/// Append-only history of analyzed companies. One row per completed run;
/// rows are never updated or deleted.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: i64,
    pub company_name: String,
    pub analyzed_at: String,
    pub source_count: i64,
    pub short_list: Vec<String>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", database_path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                analyzed_at TEXT NOT NULL,
                source_count INTEGER NOT NULL,
                short_list TEXT NOT NULL,
                precision REAL,
                recall REAL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!(target: TARGET_DB, "History database ready at {}", database_path);
        Ok(Database { pool })
    }

    /// Record one completed analysis.
    pub async fn record_analysis(
        &self,
        company_name: &str,
        source_count: usize,
        short_list: &[String],
        metrics: Option<&EvaluationMetrics>,
    ) -> Result<i64> {
        let analyzed_at = Utc::now().to_rfc3339();
        let short_list_json = serde_json::to_string(short_list)?;

        let result = sqlx::query(
            r#"
            INSERT INTO analyses (company_name, analyzed_at, source_count, short_list, precision, recall)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(company_name)
        .bind(&analyzed_at)
        .bind(source_count as i64)
        .bind(&short_list_json)
        .bind(metrics.map(|m| m.precision))
        .bind(metrics.map(|m| m.recall))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            target: TARGET_DB,
            "Recorded analysis {} for '{}' ({} shortlisted)",
            id,
            company_name,
            short_list.len()
        );
        Ok(id)
    }

    /// All past analyses, oldest first.
    pub async fn list_analyses(&self) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_name, analyzed_at, source_count, short_list, precision, recall
            FROM analyses ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let short_list_json: String = row.get("short_list");
            entries.push(HistoryEntry {
                id: row.get("id"),
                company_name: row.get("company_name"),
                analyzed_at: row.get("analyzed_at"),
                source_count: row.get("source_count"),
                short_list: serde_json::from_str(&short_list_json).unwrap_or_default(),
                precision: row.get("precision"),
                recall: row.get("recall"),
            });
        }
        Ok(entries)
    }
}
