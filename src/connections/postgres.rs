use super::models::StoredConnection;
use super::traits::ConnectionStore;
use crate::engine::DbType;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Connection store backed by the product's `connections` table
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to the connections database")?;
        Ok(Self::new(pool))
    }

    /// Create the `connections` table when it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS connections (
                id TEXT PRIMARY KEY,
                user_id UUID NOT NULL,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                config_encrypted TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_connection(row: &sqlx::postgres::PgRow) -> Result<StoredConnection> {
    let db_type: String = row.try_get("type")?;
    Ok(StoredConnection {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        db_type: db_type
            .parse::<DbType>()
            .map_err(|e| anyhow::anyhow!(e))?,
        config_encrypted: row.try_get("config_encrypted")?,
    })
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    async fn get_owned(&self, user_id: Uuid, id: &str) -> Result<Option<StoredConnection>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, type, config_encrypted
            FROM connections
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_connection).transpose()
    }

    async fn insert(&self, connection: &StoredConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO connections (id, user_id, name, type, config_encrypted)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&connection.id)
        .bind(connection.user_id)
        .bind(&connection.name)
        .bind(connection.db_type.as_str())
        .bind(&connection.config_encrypted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_config(
        &self,
        user_id: Uuid,
        id: &str,
        config_encrypted: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE connections SET config_encrypted = $1 WHERE id = $2 AND user_id = $3",
        )
        .bind(config_encrypted)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
