use super::{CounterStore, hash_fields};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::BTreeMap;

/// Keeps each snapshot as one row per field, the way a hash is laid out in
/// a key-value server.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let conn_str = if url.contains('?') || url.contains(":memory:") {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&conn_str)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS stats_snapshots (
                key TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (key, field)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    pub async fn read(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT field, value FROM stats_snapshots WHERE key = ?1")
                .bind(key)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CounterStore for SqliteStore {
    async fn write(&self, key: &str, mapping: &Map<String, Value>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stats_snapshots WHERE key = ?1")
            .bind(key)
            .execute(&mut *tx)
            .await?;

        for (field, value) in hash_fields(mapping) {
            sqlx::query("INSERT INTO stats_snapshots (key, field, value) VALUES (?1, ?2, ?3)")
                .bind(key)
                .bind(field)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM stats_snapshots WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
