// src/handlers.rs
use actix_web::web;
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::models::InventoryState;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

// ==================== EXTRACTOR CONFIG ====================

/// JSON bodies over `limit` or failing to parse come back as a 400 in the API error envelope.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            log::debug!("Rejected JSON body: {}", err);
            ApiError::bad_request(&err.to_string()).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::bad_request(&err.to_string()).into())
}

/// The lab's calendar date; expiry windows and export file names use it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Writes the inventory back after a mutation.
///
/// A failed write leaves the in-memory state as it is and comes back as a
/// notice for the response instead of an error.
pub async fn persist_inventory(app_state: &AppState, state: &InventoryState) -> Option<String> {
    match app_state.inventory_store.save(state).await {
        Ok(()) => None,
        Err(e) => {
            log::error!("Failed to save inventory: {}", e);
            Some(format!("Change applied but could not be saved: {}", e))
        }
    }
}
