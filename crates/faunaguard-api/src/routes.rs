use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use faunaguard_core::{Alert, FrameOutcome, Verdict};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Camera id used when a detect request does not name its camera.
pub const DEFAULT_CAMERA_ID: &str = "Unknown";

/// Base64 frames from high-resolution cameras exceed axum's 2 MiB default.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register/camera", post(register_camera))
        .route("/camera/detect", post(camera_detect))
        .route("/latest-alert", get(latest_alert))
        .route("/public/subscribe", post(subscribe))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RegisterCameraRequest {
    pub camera_id: Option<String>,
    pub location: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub camera_id: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub device_token: Option<String>,
    pub user_id: Option<String>,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend running!",
    }))
}

/// POST /register/camera
pub async fn register_camera(
    State(state): State<AppState>,
    payload: Result<Json<RegisterCameraRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    state
        .cameras
        .register(
            request.camera_id.as_deref().unwrap_or_default(),
            request.location.as_deref(),
            request.secret.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Camera registered",
    })))
}

/// POST /camera/detect
///
/// Detection faults are answered with HTTP 200 and `"status": "error"`; only a missing image
/// or an unreadable body is a 400.
pub async fn camera_detect(
    State(state): State<AppState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let Some(image) = request.image else {
        return Err(ApiError::BadRequest("Image missing".into()));
    };
    let camera_id = request
        .camera_id
        .unwrap_or_else(|| DEFAULT_CAMERA_ID.to_string());

    let body = match state.engine.process_frame(&camera_id, image).await {
        FrameOutcome::Decided(Verdict::Dangerous { animal, confidence }) => json!({
            "status": "success",
            "dangerous": true,
            "animal": animal,
            "confidence": confidence,
        }),
        FrameOutcome::Decided(Verdict::Clear { animals_detected }) => json!({
            "status": "success",
            "dangerous": false,
            "animals_detected": animals_detected,
        }),
        FrameOutcome::Fault { message } => json!({
            "status": "error",
            "message": message,
        }),
    };

    Ok(Json(body))
}

/// GET /latest-alert
pub async fn latest_alert(State(state): State<AppState>) -> Json<Alert> {
    Json(state.latest.get().await)
}

/// POST /public/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    state
        .subscribers
        .subscribe(
            request.device_token.as_deref().unwrap_or_default(),
            request.user_id,
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Subscribed to alerts!",
    })))
}
