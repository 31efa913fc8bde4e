use anyhow::Context;
use sqlx::{Connection, SqliteConnection};

use super::repo_types::HistoryEntry;

/// Append-only log of analyses backed by a single SQLite table.
///
/// Every operation opens its own connection and closes it before returning;
/// there is no pool and no state shared between calls besides the file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    database_url: String,
}

impl HistoryStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    async fn open(&self) -> anyhow::Result<SqliteConnection> {
        SqliteConnection::connect(&self.database_url)
            .await
            .with_context(|| format!("open history store {}", self.database_url))
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        let mut conn = self.open().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meal_time TEXT,
                calorie_report TEXT,
                image BLOB,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut conn)
        .await
        .context("create history table")?;
        conn.close().await.context("close history store")?;
        Ok(())
    }

    /// Inserts one row and returns its id. The timestamp is assigned by SQLite.
    pub async fn append(
        &self,
        meal_time: &str,
        calorie_report: &str,
        image: &[u8],
    ) -> anyhow::Result<i64> {
        let mut conn = self.open().await?;
        let id = sqlx::query(
            r#"
            INSERT INTO history (meal_time, calorie_report, image)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(meal_time)
        .bind(calorie_report)
        .bind(image)
        .execute(&mut conn)
        .await
        .context("insert history entry")?
        .last_insert_rowid();
        conn.close().await.context("close history store")?;
        Ok(id)
    }

    /// Newest first. `CURRENT_TIMESTAMP` only has second resolution, so rows
    /// written within the same second fall back to insertion order.
    pub async fn list_all(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let mut conn = self.open().await?;
        let rows = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, meal_time, calorie_report, image, timestamp
              FROM history
             ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&mut conn)
        .await
        .context("list history")?;
        conn.close().await.context("close history store")?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<HistoryEntry>> {
        let mut conn = self.open().await?;
        let row = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, meal_time, calorie_report, image, timestamp
              FROM history
             WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut conn)
        .await
        .context("get history entry")?;
        conn.close().await.context("close history store")?;
        Ok(row)
    }
}
