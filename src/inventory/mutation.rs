// src/inventory/mutation.rs
//! The only two transitions the inventory state knows: add a lot, record a usage.
//!
//! Neither re-validates its input; the form layer (`crate::validator`) does that.

use uuid::Uuid;

use crate::models::{ChemicalLot, CreateChemicalRequest, InventoryState, RecordUsageRequest, UsageEvent};

/// Result of recording a usage event.
///
/// `remaining_balance` is `None` when the event referenced no known lot: the event
/// is still appended to the history but no balance changed.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageOutcome {
    pub event: UsageEvent,
    pub remaining_balance: Option<f64>,
}

impl InventoryState {
    /// Appends a new lot with a fresh id and `current_balance == quantity`.
    pub fn add_chemical(&mut self, request: CreateChemicalRequest) -> &ChemicalLot {
        let lot = ChemicalLot {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            quantity: request.quantity,
            unit: request.unit,
            supplier: request.supplier,
            date_received: request.date_received,
            expiry_date: request.expiry_date,
            storage_location: request.storage_location,
            remark: request.remark,
            current_balance: request.quantity,
        };

        log::info!("Added chemical {} ({} {})", lot.name, lot.quantity, lot.unit);

        self.chemicals.push(lot);
        &self.chemicals[self.chemicals.len() - 1]
    }

    /// Appends a usage event and draws the referenced lot down, flooring at zero.
    pub fn record_usage(&mut self, request: RecordUsageRequest) -> UsageOutcome {
        let lot = self.chemicals.iter_mut().find(|c| c.id == request.chemical_id);

        let (chemical_name, remaining_balance) = match lot {
            Some(lot) => {
                lot.current_balance = (lot.current_balance - request.quantity_used).max(0.0);
                (lot.name.clone(), Some(lot.current_balance))
            }
            None => {
                log::warn!(
                    "Usage recorded against unknown chemical {}; no balance updated",
                    request.chemical_id
                );
                (request.chemical_id.clone(), None)
            }
        };

        let event = UsageEvent {
            id: Uuid::new_v4().to_string(),
            chemical_id: request.chemical_id,
            chemical_name,
            quantity_used: request.quantity_used,
            date_used: request.date_used,
            person_in_charge: request.person_in_charge,
            remark: request.remark,
        };

        log::info!(
            "{} used {} of {} (remaining: {:?})",
            event.person_in_charge, event.quantity_used, event.chemical_name, remaining_balance
        );

        self.usage_history.push(event.clone());

        UsageOutcome { event, remaining_balance }
    }
}
