// src/models/mod.rs

pub mod chemical;
pub mod flow;
pub mod usage;

pub use chemical::*;
pub use flow::*;
pub use usage::*;

use serde::{Deserialize, Serialize};

// ==================== INVENTORY STATE ====================

/// Everything the inventory application owns, persisted as one blob.
///
/// Only the mutation engine changes it; see `inventory::mutation`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct InventoryState {
    #[serde(default)]
    pub chemicals: Vec<ChemicalLot>,
    #[serde(default, rename = "usageHistory")]
    pub usage_history: Vec<UsageEvent>,
}

impl InventoryState {
    pub fn find_chemical(&self, id: &str) -> Option<&ChemicalLot> {
        self.chemicals.iter().find(|c| c.id == id)
    }
}
