use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use faunaguard_api::{router, AppState};
use faunaguard_core::{Alert, AlertDispatcher, DispatchError, Settings, Subscriber};
use faunaguard_detect::{encode_png, DetectError, Detection, Detector, RgbImage};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "route-test-secret";

/// Replays a scripted detection list, or fails when none is scripted.
struct ScriptedDetector(Option<Vec<Detection>>);

#[async_trait]
impl Detector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn detect(&self, _frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        self.0
            .clone()
            .ok_or_else(|| DetectError::Backend("model exploded".into()))
    }
}

#[derive(Default)]
struct CountingDispatcher {
    alerts: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertDispatcher for CountingDispatcher {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn notify(&self, alert: &Alert, _subscribers: &[Subscriber]) -> Result<(), DispatchError> {
        self.alerts.lock().expect("dispatcher lock").push(alert.clone());
        Ok(())
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    dispatcher: Arc<CountingDispatcher>,
}

fn test_app(detections: Option<Vec<Detection>>) -> TestApp {
    let settings = Settings {
        camera_secret: SECRET.to_string(),
        ..Settings::default()
    };
    let dispatcher = Arc::new(CountingDispatcher::default());
    let state = AppState::new(
        &settings,
        Arc::new(ScriptedDetector(detections)),
        dispatcher.clone(),
    );
    TestApp {
        app: router(state.clone()),
        state,
        dispatcher,
    }
}

fn frame_base64() -> String {
    STANDARD.encode(encode_png(&RgbImage::new(6, 6)).expect("encode png"))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("route response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

#[tokio::test]
async fn health_reports_ok() {
    let t = test_app(Some(Vec::new()));

    let (status, body) = send(&t.app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Backend running!"}));
}

#[tokio::test]
async fn register_with_wrong_secret_is_unauthorized() {
    let t = test_app(Some(Vec::new()));

    let (status, body) = post_json(
        &t.app,
        "/register/camera",
        json!({"camera_id": "cam-1", "location": "North Gate", "secret": "nope"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": "error", "message": "Invalid secret"}));
    assert!(t.state.cameras.is_empty().await);
}

#[tokio::test]
async fn register_without_camera_id_is_bad_request() {
    let t = test_app(Some(Vec::new()));

    let (status, body) =
        post_json(&t.app, "/register/camera", json!({"secret": SECRET})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(t.state.cameras.is_empty().await);
}

#[tokio::test]
async fn registered_location_flows_into_latest_alert() {
    let t = test_app(Some(vec![Detection::new("cat", 0.9), Detection::new("lion", 0.81)]));

    let (status, body) = post_json(
        &t.app,
        "/register/camera",
        json!({"camera_id": "cam-1", "location": "North Gate", "secret": SECRET}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "Camera registered"}));

    let (status, body) = post_json(
        &t.app,
        "/camera/detect",
        json!({"camera_id": "cam-1", "image": frame_base64()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "success", "dangerous": true, "animal": "lion", "confidence": 0.81})
    );

    let (_, alert) = send(&t.app, Method::GET, "/latest-alert", None).await;
    assert_eq!(
        alert,
        json!({
            "animal_detected": true,
            "animal_type": "lion",
            "location": "North Gate",
            "confidence": 0.81
        })
    );
    assert_eq!(t.dispatcher.alerts.lock().expect("dispatcher lock").len(), 1);
}

#[tokio::test]
async fn detect_without_camera_id_uses_unknown_location() {
    let t = test_app(Some(vec![Detection::new("Tiger", 0.93)]));

    let (status, _) = post_json(&t.app, "/camera/detect", json!({"image": frame_base64()})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, alert) = send(&t.app, Method::GET, "/latest-alert", None).await;
    assert_eq!(alert["location"], "Unknown");
    assert_eq!(alert["animal_type"], "Tiger");
}

#[tokio::test]
async fn clear_frame_lists_every_detection() {
    let t = test_app(Some(vec![Detection::new("cat", 0.9), Detection::new("dog", 0.7)]));

    let (status, body) = post_json(
        &t.app,
        "/camera/detect",
        json!({"camera_id": "cam-1", "image": frame_base64()}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "dangerous": false,
            "animals_detected": [["cat", 0.9], ["dog", 0.7]]
        })
    );
    assert!(t.dispatcher.alerts.lock().expect("dispatcher lock").is_empty());
}

#[tokio::test]
async fn missing_image_is_bad_request() {
    let t = test_app(Some(Vec::new()));

    let (status, body) = post_json(&t.app, "/camera/detect", json!({"camera_id": "cam-1"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Image missing"}));
}

#[tokio::test]
async fn detection_fault_is_reported_with_ok_status() {
    let t = test_app(None);

    let (status, body) = post_json(&t.app, "/camera/detect", json!({"image": frame_base64()})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(
        body["message"].as_str().unwrap_or_default().contains("model exploded"),
        "body was {body}"
    );
}

#[tokio::test]
async fn garbage_image_is_reported_with_ok_status() {
    let t = test_app(Some(vec![Detection::new("lion", 0.9)]));

    let (status, body) = post_json(&t.app, "/camera/detect", json!({"image": "bm90IGFuIGltYWdl"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(t.state.latest.get().await, Alert::default());
}

/// Noise does not compress, so the encoded PNG stays close to the raw pixel size.
fn noisy_frame_base64(width: u32, height: u32) -> String {
    let mut state: u32 = 0x9e37_79b9;
    let pixels = (0..width * height * 3)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect();
    let frame = RgbImage::from_raw(width, height, pixels).expect("frame buffer size");
    STANDARD.encode(encode_png(&frame).expect("encode png"))
}

#[tokio::test]
async fn frames_larger_than_two_mebibytes_are_accepted() {
    let t = test_app(Some(vec![Detection::new("wolf", 0.72)]));
    let image = noisy_frame_base64(1024, 768);
    assert!(image.len() > 2 * 1024 * 1024, "frame only {} bytes", image.len());

    let (status, body) = post_json(
        &t.app,
        "/camera/detect",
        json!({"camera_id": "cam-1", "image": image}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["dangerous"], true);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let t = test_app(Some(Vec::new()));

    let (status, body) =
        send(&t.app, Method::POST, "/camera/detect", Some("{not json".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn subscribe_requires_device_token() {
    let t = test_app(Some(Vec::new()));

    let (status, body) = post_json(&t.app, "/public/subscribe", json!({"user_id": "u-1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Device token missing"}));

    let (status, _) =
        post_json(&t.app, "/public/subscribe", json!({"device_token": "", "user_id": "u-1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(t.state.subscribers.is_empty().await);
}

#[tokio::test]
async fn subscribe_appends_duplicates() {
    let t = test_app(Some(Vec::new()));

    for _ in 0..2 {
        let (status, body) = post_json(
            &t.app,
            "/public/subscribe",
            json!({"device_token": "tok-123", "user_id": "u-1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success", "message": "Subscribed to alerts!"}));
    }

    assert_eq!(t.state.subscribers.len().await, 2);
}

#[tokio::test]
async fn latest_alert_is_stable_between_detections() {
    let t = test_app(Some(vec![Detection::new("bear", 0.7)]));
    post_json(&t.app, "/camera/detect", json!({"image": frame_base64()})).await;

    let (_, first) = send(&t.app, Method::GET, "/latest-alert", None).await;
    let (_, second) = send(&t.app, Method::GET, "/latest-alert", None).await;

    assert_eq!(first, second);
    assert_eq!(first["animal_detected"], true);
}

#[tokio::test]
async fn initial_latest_alert_is_empty() {
    let t = test_app(Some(Vec::new()));

    let (status, body) = send(&t.app, Method::GET, "/latest-alert", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"animal_detected": false, "animal_type": null, "location": null, "confidence": 0.0})
    );
}
