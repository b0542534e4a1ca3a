// src/inventory/mod.rs
//! Chemical inventory core: derived views, state transitions and reports.

pub mod derivation;
pub mod export;
pub mod mutation;

pub use derivation::{derive_view, compute_alerts, TaggedLot, ViewParams};
