// src/inventory_handlers.rs
//! HTTP surface of the chemical inventory

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{persist_inventory, today, ApiResponse};
use crate::inventory::derivation::{FilterMode, SortDirection, SortKey};
use crate::inventory::export::{export_filename, format_report, render_print_report};
use crate::inventory::{compute_alerts, derive_view, TaggedLot, ViewParams};
use crate::models::{CreateChemicalRequest, RecordUsageRequest, UsageEvent};
use crate::validator::{validate_new_chemical, validate_usage};

// ==================== QUERY ====================

#[derive(Debug, Deserialize, Default)]
pub struct InventoryQuery {
    pub search: Option<String>,
    pub filter: Option<FilterMode>,
    pub sort_by: Option<SortKey>,
    pub sort_order: Option<SortDirection>,
}

impl InventoryQuery {
    pub fn to_params(&self) -> ViewParams {
        ViewParams {
            search: self.search.clone().unwrap_or_default(),
            filter: self.filter.unwrap_or_default(),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub usage: UsageEvent,
    pub remaining_balance: Option<f64>,
}

// ==================== VIEW ====================

pub async fn get_chemicals(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<InventoryQuery>,
) -> ApiResult<HttpResponse> {
    let state = app_state.inventory.read().await;
    let view = derive_view(&state.chemicals, &query.to_params(), today());

    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn get_chemical(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let chemical_id = path.into_inner();
    let state = app_state.inventory.read().await;

    let lot = state
        .find_chemical(&chemical_id)
        .ok_or_else(|| ApiError::chemical_not_found(&chemical_id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TaggedLot::new(lot, today()))))
}

pub async fn get_alerts(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let state = app_state.inventory.read().await;
    let alerts = compute_alerts(&state.chemicals, today());

    Ok(HttpResponse::Ok().json(ApiResponse::success(alerts)))
}

pub async fn get_usage_history(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let state = app_state.inventory.read().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(&state.usage_history)))
}

// ==================== MUTATIONS ====================

pub async fn add_chemical(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<CreateChemicalRequest>,
) -> ApiResult<HttpResponse> {
    let request = request.into_inner();
    let warnings = validate_new_chemical(&request).into_result()?;

    let mut state = app_state.inventory.write().await;
    let lot = state.add_chemical(request).clone();
    let notice = persist_inventory(&app_state, &state).await;

    let mut messages: Vec<String> = warnings.into_values().flatten().collect();
    messages.extend(notice);

    let body = serde_json::json!({ "chemical": TaggedLot::new(&lot, today()) });
    let response = if messages.is_empty() {
        ApiResponse::success(body)
    } else {
        ApiResponse::success_with_message(body, messages.join("; "))
    };

    Ok(HttpResponse::Created().json(response))
}

pub async fn record_usage(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<RecordUsageRequest>,
) -> ApiResult<HttpResponse> {
    let request = request.into_inner();

    let mut state = app_state.inventory.write().await;
    validate_usage(&request, state.find_chemical(&request.chemical_id))?;

    let outcome = state.record_usage(request);
    let notice = persist_inventory(&app_state, &state).await;

    let body = UsageResponse {
        usage: outcome.event,
        remaining_balance: outcome.remaining_balance,
    };

    Ok(HttpResponse::Created().json(match notice {
        Some(message) => ApiResponse::success_with_message(body, message),
        None => ApiResponse::success_with_message(body, "Usage recorded successfully".to_string()),
    }))
}

// ==================== EXPORT ====================

pub async fn export_inventory(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let state = app_state.inventory.read().await;
    let document = format_report(&state.chemicals, &state.usage_history, Utc::now())?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", export_filename(today())),
        ))
        .body(document))
}

pub async fn print_report(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let state = app_state.inventory.read().await;
    let html = render_print_report(&state.chemicals, today(), Utc::now());

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
