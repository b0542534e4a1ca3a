// src/models/chemical.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::NaiveDate;
use strum::{AsRefStr, Display, EnumString};

// ==================== UNIT ====================

/// Units a lot can be received in: one volume unit and one mass unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
pub enum Unit {
    #[serde(rename = "mL")]
    #[strum(serialize = "mL")]
    Milliliter,
    #[serde(rename = "g")]
    #[strum(serialize = "g")]
    Gram,
}

// ==================== CHEMICAL LOT ====================

/// One received quantity of a single chemical.
///
/// `current_balance` stays in `[0, quantity]`. It starts equal to `quantity`
/// and only ever goes down, through usage events recorded against this lot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChemicalLot {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub supplier: String,
    pub date_received: NaiveDate,
    pub expiry_date: NaiveDate,
    pub storage_location: String,
    #[serde(default)]
    pub remark: Option<String>,
    pub current_balance: f64,
}

/// A lot as submitted by the "add chemical" form: no id, no balance yet.
#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct CreateChemicalRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(range(exclusive_min = 0.0, message = "Quantity must be positive"))]
    pub quantity: f64,

    pub unit: Unit,

    #[validate(length(min = 1, max = 255, message = "Supplier must be between 1 and 255 characters"))]
    pub supplier: String,

    pub date_received: NaiveDate,

    pub expiry_date: NaiveDate,

    #[validate(length(min = 1, max = 255, message = "Storage location must be between 1 and 255 characters"))]
    pub storage_location: String,

    #[validate(length(max = 1000, message = "Remark cannot exceed 1000 characters"))]
    pub remark: Option<String>,
}
