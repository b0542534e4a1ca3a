// src/models/flow.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::{DateTime, Utc};

// ==================== FLOW READING ====================

/// One timed measurement converted to a flow rate.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct FlowReading {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub flow_rate: f64,
    pub operator: String,
    pub deepwell_1: Option<f64>,
    pub deepwell_2: Option<f64>,
    pub remark: Option<String>,
}

/// Operator-entered fields that accompany a reading.
///
/// Missing keys deserialize to their defaults so validation, not parsing,
/// reports an absent operator.
#[derive(Debug, Deserialize, Serialize, Validate, Clone, Default)]
#[serde(default)]
pub struct ReadingFields {
    #[validate(length(min = 2, max = 100, message = "Operator name must be at least 2 characters"))]
    pub operator: String,

    #[validate(range(min = 0.0, message = "Deepwell reading cannot be negative"))]
    pub deepwell_1: Option<f64>,

    #[validate(range(min = 0.0, message = "Deepwell reading cannot be negative"))]
    pub deepwell_2: Option<f64>,

    #[validate(length(max = 1000, message = "Remark cannot exceed 1000 characters"))]
    pub remark: Option<String>,
}

/// Manual log of a reading whose elapsed time was measured elsewhere.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReadingRequest {
    #[validate(range(min = 1, message = "Elapsed time must be greater than zero"))]
    pub elapsed_centiseconds: u64,

    #[serde(flatten)]
    #[validate(nested)]
    pub fields: ReadingFields,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub elapsed_centiseconds: u64,
}

// ==================== AGGREGATE REPORT ====================

/// A submitted snapshot of all readings with their count and mean rate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FlowReport {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub readings: Vec<FlowReading>,
    pub count: i64,
    pub mean_flow_rate: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct FlowSummary {
    pub count: i64,
    pub mean_flow_rate: f64,
}
