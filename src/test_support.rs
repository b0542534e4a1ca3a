// src/test_support.rs
use std::sync::Arc;

use crate::AppState;
use crate::config::Config;
use crate::db::tests::memory_pool;

/// App state over a fresh in-memory database with a fast stopwatch tick.
pub(crate) async fn test_app_state() -> Arc<AppState> {
    let mut config = Config::default();
    config.inventory.storage_key = "test-inventory".to_string();
    config.flow.tick_interval_ms = 10;

    Arc::new(AppState::build(config, memory_pool().await).await.unwrap())
}
