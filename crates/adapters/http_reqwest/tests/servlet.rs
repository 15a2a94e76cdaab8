//! Exercises the HTTP adapter against a stand-in servlet served by axum on
//! an ephemeral local port.

use std::collections::HashMap;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;

use sensordb_adapter_http_reqwest::{HttpServiceConfig, ReqwestSensorDbService};
use sensordb_app::ports::SensorDbService;
use sensordb_domain::error::SensorDbError;
use sensordb_domain::time::from_epoch_millis;

async fn get_log(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("id").map(String::as_str) {
        Some("42") => Json(json!({"ok": true, "log": {"log": "line1\nline2"}})).into_response(),
        Some("boom") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "log table unavailable"})),
        )
            .into_response(),
        Some("bare") => StatusCode::BAD_GATEWAY.into_response(),
        _ => Json(json!({"ok": true})).into_response(),
    }
}

fn servlet() -> Router {
    Router::new()
        .route(
            "/sensorDb/servlet/db/getLocations",
            get(|| async {
                Json(json!({
                    "ok": true,
                    "locations": [
                        {"type": "location", "id": 2, "name": "B", "elevation": 10},
                        {"type": "location", "id": 1, "name": "A", "elevation": 20}
                    ]
                }))
            }),
        )
        .route(
            "/sensorDb/servlet/db/getDeviceTypes",
            get(|| async {
                Json(json!({
                    "ok": true,
                    "deviceTypes": [
                        {"type": "deviceType", "name": "HOBO U20"},
                        {"manufacturer_device_name": "CR1000", "device_type": "logger"}
                    ]
                }))
            }),
        )
        .route(
            "/sensorDb/servlet/db/getDevices",
            get(|| async {
                Json(json!({
                    "ok": true,
                    "devices": [
                        {"type": "device", "id": "d1", "serialNumber": "SN-100", "notes": ""}
                    ]
                }))
            }),
        )
        .route(
            "/sensorDb/servlet/db/getListOfLogEntries",
            get(|| async {
                Json(json!({
                    "ok": true,
                    "logEntries": [{"id": "42", "timestamp": 1_425_445_567_000_i64}]
                }))
            }),
        )
        .route("/sensorDb/servlet/db/getLog", get(get_log))
}

/// Serve the stand-in servlet and return a client pointed at it.
async fn service() -> ReqwestSensorDbService {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound socket has an address");
    tokio::spawn(async move {
        axum::serve(listener, servlet()).await.ok();
    });

    ReqwestSensorDbService::new(&HttpServiceConfig {
        base_url: format!("http://{addr}/sensorDb/servlet/db"),
        timeout_secs: 5,
    })
    .expect("client should build")
}

#[tokio::test]
async fn should_decode_locations_with_numeric_ids() {
    let locations = service().await.get_locations().await.unwrap();

    let decoded: Vec<_> = locations
        .iter()
        .map(|l| (l.id.as_str(), l.name.as_str()))
        .collect();
    assert_eq!(decoded, vec![("2", "B"), ("1", "A")]);
}

#[tokio::test]
async fn should_decode_device_types_under_either_field_name() {
    let device_types = service().await.get_device_types().await.unwrap();

    assert_eq!(device_types[0].manufacturer_device_name, "HOBO U20");
    assert_eq!(device_types[1].manufacturer_device_name, "CR1000");
    assert_eq!(device_types[1].device_type.as_deref(), Some("logger"));
}

#[tokio::test]
async fn should_decode_servlet_serial_number_field() {
    let devices = service().await.get_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].serial_number, "SN-100");
}

#[tokio::test]
async fn should_decode_log_entry_timestamps() {
    let entries = service().await.get_list_of_log_entries().await.unwrap();

    assert_eq!(entries[0].id.as_str(), "42");
    assert_eq!(
        entries[0].timestamp,
        from_epoch_millis(1_425_445_567_000).unwrap()
    );
}

#[tokio::test]
async fn should_fetch_log_by_id() {
    let detail = service()
        .await
        .get_log(&"42".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(detail.log, "line1\nline2");
}

#[tokio::test]
async fn should_report_missing_log_as_not_found() {
    let result = service().await.get_log(&"7".parse().unwrap()).await;

    assert!(matches!(result, Err(SensorDbError::NotFound(_))));
}

#[tokio::test]
async fn should_surface_servlet_error_message() {
    let result = service().await.get_log(&"boom".parse().unwrap()).await;

    match result {
        Err(SensorDbError::Rejected(message)) => assert_eq!(message, "log table unavailable"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn should_fall_back_to_status_when_error_body_is_missing() {
    let result = service().await.get_log(&"bare".parse().unwrap()).await;

    match result {
        Err(SensorDbError::Rejected(message)) => assert_eq!(message, "HTTP 502 Bad Gateway"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn should_report_unreachable_servlet_as_service_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = ReqwestSensorDbService::new(&HttpServiceConfig {
        base_url: format!("http://{addr}/db"),
        timeout_secs: 5,
    })
    .unwrap();
    let result = service.get_locations().await;

    assert!(matches!(result, Err(SensorDbError::Service(_))));
}
