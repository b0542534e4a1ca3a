// src/flow/mod.rs
//! Flow-rate (GPM) stopwatch calculator.

pub mod calc;
pub mod stopwatch;

pub use calc::{build_reading, compute_flow_rate, summarize, FlowStatus};
pub use stopwatch::{StopwatchHandle, StopwatchSnapshot};
