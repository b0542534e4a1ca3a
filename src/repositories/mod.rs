// src/repositories/mod.rs
//! Persistence boundaries. The core engines never see these; the service layer
//! loads state through them and writes back after every mutation.

pub mod flow;
pub mod inventory;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{FlowReading, FlowReport, InventoryState};

pub use flow::SqliteReadingStore;
pub use inventory::SqliteInventoryStore;

/// Load/save of the whole inventory as one serialized blob under a fixed key.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// A missing or unreadable blob yields the empty state.
    async fn load(&self) -> ApiResult<InventoryState>;

    async fn save(&self, state: &InventoryState) -> ApiResult<()>;
}

/// Document collections behind the flow application.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// All readings, newest first.
    async fn list(&self) -> ApiResult<Vec<FlowReading>>;

    async fn create(&self, reading: &FlowReading) -> ApiResult<()>;

    async fn delete(&self, id: &str) -> ApiResult<()>;

    /// Removes every reading and returns how many there were.
    async fn clear(&self) -> ApiResult<u64>;

    async fn create_report(&self, report: &FlowReport) -> ApiResult<()>;

    async fn list_reports(&self) -> ApiResult<Vec<FlowReport>>;
}
