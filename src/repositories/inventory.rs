// src/repositories/inventory.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::ApiResult;
use crate::models::InventoryState;
use super::InventoryStore;

pub struct SqliteInventoryStore {
    pool: SqlitePool,
    key: String,
}

impl SqliteInventoryStore {
    pub fn new(pool: SqlitePool, key: impl Into<String>) -> Self {
        Self { pool, key: key.into() }
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    async fn load(&self) -> ApiResult<InventoryState> {
        let payload: Option<(String,)> = sqlx::query_as("SELECT payload FROM app_state WHERE key = ?")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await?;

        let Some((payload,)) = payload else {
            log::info!("No saved inventory under '{}', starting empty", self.key);
            return Ok(InventoryState::default());
        };

        match serde_json::from_str::<InventoryState>(&payload) {
            Ok(state) => {
                log::info!(
                    "Loaded inventory '{}': {} chemicals, {} usage records",
                    self.key, state.chemicals.len(), state.usage_history.len()
                );
                Ok(state)
            }
            Err(e) => {
                log::warn!("Saved inventory '{}' is malformed ({}); starting empty", self.key, e);
                Ok(InventoryState::default())
            }
        }
    }

    async fn save(&self, state: &InventoryState) -> ApiResult<()> {
        let payload = serde_json::to_string(state)?;

        sqlx::query(
            r#"INSERT INTO app_state (key, payload, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at"#
        )
            .bind(&self.key)
            .bind(&payload)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
