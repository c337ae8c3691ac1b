//! Integration tests for qkd-ingest API endpoints

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use helpers::{enrichment_record, write_record, TELEMETRY};
use http_body_util::BodyExt;
use qkd_ingest::enrichment::FileEnrichment;
use qkd_ingest::workflow::RecordPipeline;
use qkd_ingest::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Test helper: offline app
fn create_test_app() -> axum::Router {
    build_router(AppState::new(RecordPipeline::default()))
}

/// Test helper: POST JSON, return status and parsed body
async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "qkd-ingest");
    assert_eq!(json["enrichment"], "none");
    assert!(json["version"].is_string());
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_extract_endpoint() {
    let (status, json) = post_json(create_test_app(), "/api/extract", json!({ "text": TELEMETRY })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["partial"]["meta"]["vendor"], "Toshiba");
    assert_eq!(json["partial"]["security"]["qber_total"], 0.026);
    assert_eq!(json["partial"]["_provenance"].as_array().unwrap().len(), 6);
    assert_eq!(
        json["partial"]["_provenance"][0],
        json!({ "field": "meta.vendor", "snippet": "Vendor: Toshiba", "confidence_score": 1.0 })
    );
    assert!(json["remaining"].as_str().unwrap().starts_with("operator note"));
}

#[tokio::test]
async fn test_extract_accepts_empty_text() {
    let (status, json) = post_json(create_test_app(), "/api/extract", json!({ "text": "" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["partial"]["_provenance"], json!([]));
    assert_eq!(json["remaining"], "");
}

#[tokio::test]
async fn test_extract_keeps_blank_text_as_remaining() {
    let (status, json) = post_json(create_test_app(), "/api/extract", json!({ "text": "  \n " })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["remaining"], "  \n ");
}

#[tokio::test]
async fn test_extract_rejects_missing_text() {
    let (status, _) = post_json(create_test_app(), "/api/extract", json!({})).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_merge_endpoint() {
    let high = json!({
        "security": { "qber_total": 0.026 },
        "_provenance": [
            { "field": "security.qber_total", "snippet": "QBER: 0.026", "confidence_score": 1.0 }
        ]
    });
    let low = serde_json::to_value(enrichment_record()).unwrap();

    let (status, json) = post_json(
        create_test_app(),
        "/api/merge",
        json!({ "high_trust": high, "low_trust": low }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["security"]["qber_total"], 0.026);
    assert_eq!(json["link"]["distance_km"], 42.5);

    let fields: Vec<&str> = json["_provenance"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec!["security.qber_total", "link.channel_loss_db", "link.distance_km"]
    );
    assert_eq!(json["_provenance"][0]["snippet"], "QBER: 0.026");
}

#[tokio::test]
async fn test_merge_accepts_null_sections() {
    let (status, json) = post_json(
        create_test_app(),
        "/api/merge",
        json!({
            "high_trust": { "link": null, "_provenance": null },
            "low_trust": { "link": { "distance_km": 12.0 } }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["link"]["distance_km"], 12.0);
}

#[tokio::test]
async fn test_skr_endpoint_success() {
    let record = json!({
        "security": {
            "sifted_key_rate_bps": 180000,
            "qber_total": 0.026,
            "sifted_bits": 1500000,
            "epsilon": 1e-9
        }
    });

    let (status, json) = post_json(create_test_app(), "/api/skr", record).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.get("error").is_none());
    assert_eq!(json["inputs"]["beta"], 1.1);
    assert_eq!(json["inputs"]["S_bps"], 180000.0);
    assert!(json["intermediates"]["h2_Q"].as_f64().unwrap() > 0.17);
    let rate = json["R_secure_bps"].as_f64().unwrap();
    assert!(rate > 100_000.0 && rate < 120_000.0, "unexpected rate {}", rate);
    assert_eq!(json["trace"].as_array().unwrap().last().unwrap()["step"], "R_secure_bps");
}

#[tokio::test]
async fn test_skr_endpoint_missing_inputs() {
    let (status, json) = post_json(create_test_app(), "/api/skr", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["R_secure_bps"], Value::Null);
    assert_eq!(json["inputs"], json!({}));
    assert_eq!(json["intermediates"], json!({}));
    assert_eq!(
        json["error"],
        "Missing required inputs: S_bps, Q, N, eps_sec, eps_cor"
    );
}

#[tokio::test]
async fn test_process_endpoint_offline() {
    let (status, json) = post_json(create_test_app(), "/api/process", json!({ "text": TELEMETRY })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["record_id"].is_string());
    assert_eq!(json["enrichment_source"], "none");
    assert!(json.get("enrichment_error").is_none());
    assert_eq!(json["record"]["meta"]["device_id"], "QKD-TX-07");
    assert!(json["skr"]["R_secure_bps"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_process_endpoint_with_file_enrichment() {
    let file = write_record(&enrichment_record());
    let pipeline = RecordPipeline::default().with_enricher(Arc::new(FileEnrichment::new(file.path())));
    let app = build_router(AppState::new(pipeline));

    let (status, json) = post_json(app, "/api/process", json!({ "text": TELEMETRY })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["enrichment_source"], "file");
    assert_eq!(json["record"]["security"]["qber_total"], 0.026);
    assert_eq!(json["record"]["link"]["channel_loss_db"], 9.0);
}

#[tokio::test]
async fn test_process_required_enrichment_failure_is_bad_gateway() {
    let pipeline = RecordPipeline::default()
        .with_enricher(Arc::new(FileEnrichment::new("/nonexistent/enrichment.json")))
        .require_enrichment(true);
    let app = build_router(AppState::new(pipeline));

    let (status, json) = post_json(app, "/api/process", json!({ "text": TELEMETRY })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "ENRICHMENT_ERROR");
}

#[tokio::test]
async fn test_process_rejects_empty_text() {
    let (status, _) = post_json(create_test_app(), "/api/process", json!({ "text": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
