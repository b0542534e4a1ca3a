// src/flow/calc.rs
//! Elapsed time to flow rate, the threshold status flag, and the aggregate summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::config::FlowConfig;
use crate::models::{FlowReading, FlowSummary, ReadingFields};

const SECONDS_PER_HOUR: f64 = 3600.0;
const FLOW_FACTOR: f64 = 4.4;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn centiseconds_to_seconds(centiseconds: u64) -> f64 {
    centiseconds as f64 / 100.0
}

/// `(1 / seconds) * 3600 * 4.4`, rounded to 2 decimals. Zero elapsed time gives 0.
pub fn compute_flow_rate(elapsed_centiseconds: u64) -> f64 {
    if elapsed_centiseconds == 0 {
        return 0.0;
    }
    let seconds = centiseconds_to_seconds(elapsed_centiseconds);
    round2((1.0 / seconds) * SECONDS_PER_HOUR * FLOW_FACTOR)
}

/// `MM:SS.cc`, the way the stopwatch face shows it.
pub fn format_elapsed(elapsed_centiseconds: u64) -> String {
    let minutes = elapsed_centiseconds / 6000;
    let seconds = (elapsed_centiseconds / 100) % 60;
    let centis = elapsed_centiseconds % 100;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

// ==================== STATUS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Idle,
    Low,
    Normal,
    High,
}

impl FlowStatus {
    pub fn classify(flow_rate: f64, config: &FlowConfig) -> Self {
        if flow_rate <= 0.0 {
            FlowStatus::Idle
        } else if flow_rate < config.low_rate_threshold {
            FlowStatus::Low
        } else if flow_rate > config.high_rate_threshold {
            FlowStatus::High
        } else {
            FlowStatus::Normal
        }
    }
}

// ==================== READINGS ====================

/// Builds the reading logged for a stopped, non-zero timer.
pub fn build_reading(elapsed_centiseconds: u64, fields: ReadingFields, timestamp: DateTime<Utc>) -> FlowReading {
    FlowReading {
        id: Uuid::new_v4().to_string(),
        timestamp,
        duration_seconds: centiseconds_to_seconds(elapsed_centiseconds),
        flow_rate: compute_flow_rate(elapsed_centiseconds),
        operator: fields.operator.trim().to_string(),
        deepwell_1: fields.deepwell_1,
        deepwell_2: fields.deepwell_2,
        remark: fields.remark.filter(|r| !r.trim().is_empty()),
    }
}

pub fn summarize(readings: &[FlowReading]) -> FlowSummary {
    if readings.is_empty() {
        return FlowSummary { count: 0, mean_flow_rate: 0.0 };
    }
    let total: f64 = readings.iter().map(|r| r.flow_rate).sum();
    FlowSummary {
        count: readings.len() as i64,
        mean_flow_rate: round2(total / readings.len() as f64),
    }
}
