use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;
use warden_endpoint::{EndpointError, EndpointRecord, EndpointSubscriber};

/// System of record for the endpoint inventory. Rows are upserted by id on
/// every boot.
pub struct EndpointRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct EndpointRow {
    id: String,
    path: String,
    method: String,
    action: String,
    resource: String,
    controller: String,
    summary: Option<String>,
}

impl From<EndpointRow> for EndpointRecord {
    fn from(row: EndpointRow) -> Self {
        Self {
            id: row.id,
            path: row.path,
            method: row.method,
            action: row.action,
            resource: row.resource,
            controller: row.controller,
            summary: row.summary,
        }
    }
}

const SELECT_ENDPOINTS: &str =
    "SELECT id, path, method, action, resource, controller, summary FROM endpoints";

fn storage(e: sqlx::Error) -> EndpointError {
    EndpointError::Storage(e.to_string())
}

impl EndpointRepository {
    pub async fn connect(database_url: &str) -> Result<Self, EndpointError> {
        // Every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(storage)?;
        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    async fn migrate(&self) -> Result<(), EndpointError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS endpoints (
                id TEXT PRIMARY KEY NOT NULL,
                path TEXT NOT NULL,
                method TEXT NOT NULL,
                action TEXT NOT NULL,
                resource TEXT NOT NULL,
                controller TEXT NOT NULL,
                summary TEXT,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    pub async fn upsert_many(&self, records: &[EndpointRecord]) -> Result<usize, EndpointError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(storage)?;
        for record in records {
            sqlx::query(
                "INSERT INTO endpoints (id, path, method, action, resource, controller, summary, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    path = excluded.path,
                    method = excluded.method,
                    action = excluded.action,
                    resource = excluded.resource,
                    controller = excluded.controller,
                    summary = excluded.summary,
                    updated_at = excluded.updated_at",
            )
            .bind(&record.id)
            .bind(&record.path)
            .bind(&record.method)
            .bind(&record.action)
            .bind(&record.resource)
            .bind(&record.controller)
            .bind(&record.summary)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }
        tx.commit().await.map_err(storage)?;
        Ok(records.len())
    }

    pub async fn list(&self, controller: Option<&str>) -> Result<Vec<EndpointRecord>, EndpointError> {
        let rows = match controller {
            Some(controller) => {
                let sql = format!(
                    "{} WHERE controller = ? ORDER BY path, method, resource, action",
                    SELECT_ENDPOINTS
                );
                sqlx::query_as::<_, EndpointRow>(&sql)
                    .bind(controller)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "{} ORDER BY controller, path, method, resource, action",
                    SELECT_ENDPOINTS
                );
                sqlx::query_as::<_, EndpointRow>(&sql)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage)?;
        Ok(rows.into_iter().map(EndpointRecord::from).collect())
    }

    pub async fn find(&self, id: &str) -> Result<Option<EndpointRecord>, EndpointError> {
        let sql = format!("{} WHERE id = ?", SELECT_ENDPOINTS);
        let row = sqlx::query_as::<_, EndpointRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(EndpointRecord::from))
    }

    /// Look up several ids; the second list holds ids with no row
    pub async fn find_many(
        &self,
        ids: &[String],
    ) -> Result<(Vec<EndpointRecord>, Vec<String>), EndpointError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = vec![];
        for id in ids {
            match self.find(id).await? {
                Some(record) => found.push(record),
                None => missing.push(id.clone()),
            }
        }
        Ok((found, missing))
    }

    pub async fn count(&self) -> Result<i64, EndpointError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM endpoints")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }
}

#[async_trait]
impl EndpointSubscriber for EndpointRepository {
    async fn save(&self, records: &[EndpointRecord]) -> Result<(), EndpointError> {
        let written = self.upsert_many(records).await?;
        info!(records = written, "Endpoint inventory persisted");
        Ok(())
    }
}
