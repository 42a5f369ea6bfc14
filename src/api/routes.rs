// SPDX-License-Identifier: GPL-3.0-only
//! HTTP routes
//!
//! Handlers validate the body first, then run the facade call on the
//! blocking pool since it holds the control lock across an I2C transaction.
//! Async workers never take that lock; an uninitialized facade answers 503
//! from inside the blocking call.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use super::payload::{
    self, BrightnessEcho, CommandResponse, ContrastEcho, HealthResponse, InputEcho,
    StatusResponse,
};
use crate::control::MonitorControl;
use crate::error::ControlError;
use crate::protocols::ddc_ci::VcpFeature;

/// Version reported by `/health`
pub const API_VERSION: &str = "1.0.0";

const NOT_INITIALIZED: &str = "Display control not initialized";

pub fn router(control: Arc<MonitorControl>) -> Router {
    Router::new()
        .route("/api/brightness", post(set_brightness))
        .route("/api/contrast", post(set_contrast))
        .route("/api/input", post(set_input))
        .route("/api/status", get(status))
        .route("/health", get(health))
        .with_state(control)
        .layer(TraceLayer::new_for_http())
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(CommandResponse::<()>::failure(message))).into_response()
}

fn control_failure(error: &ControlError, message: &str) -> Response {
    match error {
        ControlError::NotInitialized => failure(StatusCode::SERVICE_UNAVAILABLE, NOT_INITIALIZED),
        e if e.is_rejection() => failure(StatusCode::BAD_REQUEST, e.to_string()),
        e => {
            warn!("{}: {}", message, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Run a facade call off the async workers
async fn on_blocking_pool<T, F>(
    control: &Arc<MonitorControl>,
    failed: &str,
    op: F,
) -> Result<T, Response>
where
    F: FnOnce(&MonitorControl) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let control = Arc::clone(control);
    match tokio::task::spawn_blocking(move || op(&control)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(control_failure(&e, failed)),
        Err(e) => {
            error!("Display control task failed: {}", e);
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, failed))
        }
    }
}

async fn set_brightness(State(control): State<Arc<MonitorControl>>, body: Bytes) -> Response {
    set_level(control, VcpFeature::Brightness, body).await
}

async fn set_contrast(State(control): State<Arc<MonitorControl>>, body: Bytes) -> Response {
    set_level(control, VcpFeature::Contrast, body).await
}

async fn set_level(control: Arc<MonitorControl>, feature: VcpFeature, body: Bytes) -> Response {
    let value = match payload::level(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Rejected {} request: {}", feature.label(), e);
            return failure(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let failed = format!("Failed to set {}", feature.label().to_ascii_lowercase());
    if let Err(response) = on_blocking_pool(&control, &failed, move |c| {
        c.set_level(feature, f32::from(value))
    })
    .await
    {
        return response;
    }

    let message = format!("{} set successfully", feature.label());
    match feature {
        VcpFeature::Brightness => {
            Json(CommandResponse::success(message, BrightnessEcho { brightness: value }))
                .into_response()
        }
        VcpFeature::Contrast => {
            Json(CommandResponse::success(message, ContrastEcho { contrast: value }))
                .into_response()
        }
    }
}

async fn set_input(State(control): State<Arc<MonitorControl>>, body: Bytes) -> Response {
    let source = match payload::input_source(&body) {
        Ok(source) => source,
        Err(e) => {
            debug!("Rejected input request: {}", e);
            return failure(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let selector = i64::from(source.selector);
    match on_blocking_pool(&control, "Failed to switch input", move |c| {
        c.set_input_source(selector)
    })
    .await
    {
        Ok(source) => Json(CommandResponse::success(
            "Input switched successfully",
            InputEcho {
                input: source.selector,
                input_name: source.name,
            },
        ))
        .into_response(),
        Err(response) => response,
    }
}

async fn status(State(control): State<Arc<MonitorControl>>) -> Response {
    match tokio::task::spawn_blocking(move || control.snapshot()).await {
        Ok(snapshot) => Json(StatusResponse::from(snapshot)).into_response(),
        Err(e) => {
            error!("Status task failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read status")
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: API_VERSION,
    })
}
