// src/models/usage.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::NaiveDate;

/// A consumption drawn against a lot.
///
/// `chemical_name` is copied from the lot when the event is recorded and is
/// never re-joined afterwards, so history keeps the name as it was at use time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UsageEvent {
    pub id: String,
    pub chemical_id: String,
    pub chemical_name: String,
    pub quantity_used: f64,
    pub date_used: NaiveDate,
    pub person_in_charge: String,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct RecordUsageRequest {
    #[validate(length(min = 1, message = "Chemical must be selected"))]
    pub chemical_id: String,

    #[validate(range(exclusive_min = 0.0, message = "Quantity used must be positive"))]
    pub quantity_used: f64,

    pub date_used: NaiveDate,

    #[validate(length(min = 1, max = 255, message = "Person in charge is required"))]
    pub person_in_charge: String,

    #[validate(length(max = 1000, message = "Remark cannot exceed 1000 characters"))]
    pub remark: Option<String>,
}
