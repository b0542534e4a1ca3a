// src/flow_handlers.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::flow::calc::format_elapsed;
use crate::flow::{build_reading, compute_flow_rate, summarize, FlowStatus, StopwatchSnapshot};
use crate::handlers::ApiResponse;
use crate::models::{ComputeRequest, CreateReadingRequest, FlowReading, FlowReport, ReadingFields};
use crate::validator::{validate_reading_fields, ValidationResult};

#[derive(Debug, Serialize)]
pub struct ComputeResponse {
    pub elapsed_centiseconds: u64,
    pub display: String,
    pub flow_rate: f64,
    pub status: FlowStatus,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopwatch: StopwatchSnapshot,
    pub reading: Option<FlowReading>,
    pub errors: BTreeMap<String, Vec<String>>,
}

// ==================== CALCULATOR ====================

pub async fn compute(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<ComputeRequest>,
) -> ApiResult<HttpResponse> {
    let elapsed = request.elapsed_centiseconds;
    let flow_rate = compute_flow_rate(elapsed);

    Ok(HttpResponse::Ok().json(ApiResponse::success(ComputeResponse {
        elapsed_centiseconds: elapsed,
        display: format_elapsed(elapsed),
        flow_rate,
        status: FlowStatus::classify(flow_rate, &app_state.config.flow),
    })))
}

// ==================== STOPWATCH ====================

pub async fn get_stopwatch(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(app_state.stopwatch.snapshot())))
}

pub async fn start_stopwatch(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(app_state.stopwatch.start())))
}

pub async fn reset_stopwatch(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(app_state.stopwatch.reset())))
}

/// Stops the timer. A running timer with time on it logs a reading from the
/// submitted fields; invalid fields skip the log and come back as errors.
///
/// The timer stops whatever the body holds. A missing or unparsable body
/// counts as empty fields.
pub async fn stop_stopwatch(
    app_state: web::Data<Arc<AppState>>,
    fields: Option<web::Json<ReadingFields>>,
) -> ApiResult<HttpResponse> {
    let (elapsed, snapshot) = app_state.stopwatch.stop();
    let fields = fields.map(web::Json::into_inner).unwrap_or_default();

    let Some(elapsed) = elapsed else {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(StopResponse {
            stopwatch: snapshot,
            reading: None,
            errors: BTreeMap::new(),
        })));
    };

    let validation = validate_reading_fields(&fields);
    if !validation.is_valid() {
        log::info!("Stopwatch stopped at {} cs; reading not logged: invalid fields", elapsed);
        let message = validation.to_api_error().to_string();
        return Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            StopResponse {
                stopwatch: snapshot,
                reading: None,
                errors: validation.errors,
            },
            message,
        )));
    }

    let reading = build_reading(elapsed, fields, Utc::now());
    app_state.reading_store.create(&reading).await?;
    log::info!("Logged flow reading {} ({} GPM) by {}", reading.id, reading.flow_rate, reading.operator);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        StopResponse {
            stopwatch: snapshot,
            reading: Some(reading),
            errors: BTreeMap::new(),
        },
        "Reading logged".to_string(),
    )))
}

// ==================== READINGS ====================

pub async fn get_readings(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let readings = app_state.reading_store.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(readings)))
}

pub async fn create_reading(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<CreateReadingRequest>,
) -> ApiResult<HttpResponse> {
    let request = request.into_inner();

    let mut validation = validate_reading_fields(&request.fields);
    if let Err(errors) = request.validate() {
        validation.absorb(&errors);
    }
    validation.into_result()?;

    let reading = build_reading(request.elapsed_centiseconds, request.fields, Utc::now());
    app_state.reading_store.create(&reading).await?;
    log::info!("Logged flow reading {} ({} GPM) by {}", reading.id, reading.flow_rate, reading.operator);

    Ok(HttpResponse::Created().json(ApiResponse::success(reading)))
}

pub async fn delete_reading(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let reading_id = path.into_inner();
    app_state.reading_store.delete(&reading_id).await?;
    log::info!("Deleted flow reading {}", reading_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        reading_id,
        "Reading deleted".to_string(),
    )))
}

pub async fn clear_readings(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let removed = app_state.reading_store.clear().await?;
    log::warn!("Cleared {} flow readings", removed);

    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "removed": removed }))))
}

pub async fn get_summary(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let readings = app_state.reading_store.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summarize(&readings))))
}

// ==================== REPORTS ====================

pub async fn submit_report(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let readings = app_state.reading_store.list().await?;
    if readings.is_empty() {
        let mut empty = ValidationResult::new();
        empty.add_error("readings", "There are no readings to report");
        return Err(empty.to_api_error());
    }

    let summary = summarize(&readings);
    let report = FlowReport {
        id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        readings,
        count: summary.count,
        mean_flow_rate: summary.mean_flow_rate,
    };
    app_state.reading_store.create_report(&report).await?;
    log::info!("Submitted flow report {} over {} readings", report.id, report.count);

    Ok(HttpResponse::Created().json(ApiResponse::success(report)))
}

pub async fn get_reports(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let reports = app_state.reading_store.list_reports().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reports)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app_state;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(crate::configure_api),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_compute_classifies_rate() {
        let state = test_app_state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/compute")
            .set_json(json!({ "elapsed_centiseconds": 700 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["flow_rate"], 2262.86);
        assert_eq!(body["data"]["display"], "00:07.00");
        assert_eq!(body["data"]["status"], "high");

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/compute")
            .set_json(json!({ "elapsed_centiseconds": 0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["flow_rate"], 0.0);
        assert_eq!(body["data"]["status"], "idle");
    }

    #[actix_rt::test]
    async fn test_stop_without_time_logs_nothing() {
        let state = test_app_state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/stopwatch/stop")
            .set_json(json!({ "operator": "Ana" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["reading"].is_null());
        assert_eq!(body["data"]["stopwatch"]["running"], false);
        assert!(state.reading_store.list().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_stopwatch_run_logs_reading() {
        let state = test_app_state().await;
        let app = app!(state);

        let req = test::TestRequest::post().uri("/api/v1/flow/stopwatch/start").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["running"], true);

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/stopwatch/stop")
            .set_json(json!({ "operator": "  Ana  ", "deepwell_1": 4.5, "remark": "" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["stopwatch"]["running"], false);
        assert_eq!(body["data"]["reading"]["operator"], "Ana");
        assert!(body["data"]["reading"]["remark"].is_null());

        let readings = state.reading_store.list().await.unwrap();
        assert_eq!(readings.len(), 1);
        assert!(readings[0].duration_seconds > 0.0);

        let req = test::TestRequest::post().uri("/api/v1/flow/stopwatch/reset").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["elapsed_centiseconds"], 0);
        assert_eq!(body["data"]["display"], "00:00.00");
    }

    #[actix_rt::test]
    async fn test_stop_always_stops_even_without_fields() {
        let state = test_app_state().await;
        let app = app!(state);

        // empty object: the missing operator is reported per field
        let req = test::TestRequest::post().uri("/api/v1/flow/stopwatch/start").to_request();
        test::call_service(&app, req).await;
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/stopwatch/stop")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["stopwatch"]["running"], false);
        assert!(body["data"]["reading"].is_null());
        assert!(body["data"]["errors"]["operator"].is_array());
        assert!(!state.stopwatch.snapshot().running);

        // no body at all
        let req = test::TestRequest::post().uri("/api/v1/flow/stopwatch/start").to_request();
        test::call_service(&app, req).await;
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        let req = test::TestRequest::post().uri("/api/v1/flow/stopwatch/stop").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["stopwatch"]["running"], false);
        assert!(body["data"]["reading"].is_null());
        assert!(!state.stopwatch.snapshot().running);
        assert!(state.reading_store.list().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_stop_with_invalid_fields_skips_log() {
        let state = test_app_state().await;
        let app = app!(state);

        let req = test::TestRequest::post().uri("/api/v1/flow/stopwatch/start").to_request();
        test::call_service(&app, req).await;
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/stopwatch/stop")
            .set_json(json!({ "operator": "A", "deepwell_2": -1.0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["reading"].is_null());
        assert!(body["data"]["errors"]["operator"].is_array());
        assert!(body["data"]["errors"]["deepwell_2"].is_array());
        assert!(state.reading_store.list().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_readings_summary_and_reports() {
        let state = test_app_state().await;
        let app = app!(state);

        // nothing to report yet
        let req = test::TestRequest::post().uri("/api/v1/flow/reports").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let mut ids = Vec::new();
        for cs in [6000, 700] {
            let req = test::TestRequest::post()
                .uri("/api/v1/flow/readings")
                .set_json(json!({ "elapsed_centiseconds": cs, "operator": "Ben" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = test::read_body_json(resp).await;
            ids.push(body["data"]["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::get().uri("/api/v1/flow/summary").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["count"], 2);
        assert_eq!(body["data"]["mean_flow_rate"], 1263.43);

        let req = test::TestRequest::post().uri("/api/v1/flow/reports").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/flow/readings/{}", ids[0]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/flow/readings/{}", ids[0]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/api/v1/flow/readings").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["removed"], 1);

        // the report keeps its own snapshot
        let req = test::TestRequest::get().uri("/api/v1/flow/reports").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["count"], 2);
        assert_eq!(body["data"][0]["readings"].as_array().unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn test_manual_reading_rejects_zero_time_and_short_operator() {
        let state = test_app_state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/flow/readings")
            .set_json(json!({ "elapsed_centiseconds": 0, "operator": "B" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
