// SPDX-License-Identifier: GPL-3.0-only
//! Request decoding and response bodies
//!
//! Request fields are checked in a fixed order: the field must be present,
//! then be an integer, then be in range. Fractional numbers count as "not an
//! integer" and are never rounded.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::control::StatusSnapshot;
use crate::devices::{self, InputSource};

/// Why a request body was rejected
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid request: body must be a JSON object")]
    Malformed,

    #[error("Invalid request: missing '{0}' field")]
    Missing(&'static str),

    #[error("Invalid request: '{0}' must be an integer")]
    NotInteger(&'static str),

    #[error("{0}")]
    OutOfRange(String),
}

/// Extract an integer field from a JSON object body
pub fn integer_field(body: &[u8], key: &'static str) -> Result<i64, PayloadError> {
    let document: Value = serde_json::from_slice(body).map_err(|_| PayloadError::Malformed)?;
    let object = document.as_object().ok_or(PayloadError::Malformed)?;
    let field = object.get(key).ok_or(PayloadError::Missing(key))?;
    field.as_i64().ok_or(PayloadError::NotInteger(key))
}

/// `{"value": 0..=100}` used by brightness and contrast
pub fn level(body: &[u8]) -> Result<u8, PayloadError> {
    let value = integer_field(body, "value")?;
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| PayloadError::OutOfRange("Value must be between 0 and 100".to_string()))
}

/// `{"source": 1..=4}` used by input switching
pub fn input_source(body: &[u8]) -> Result<&'static InputSource, PayloadError> {
    let selector = integer_field(body, "source")?;
    devices::input_source(selector).ok_or_else(|| {
        let (min, max) = devices::selector_range();
        PayloadError::OutOfRange(format!(
            "Source must be between {} and {} ({})",
            min,
            max,
            devices::describe_input_sources()
        ))
    })
}

/// Body of every command route
///
/// Failures carry only `success` and `message`; the route specific fields
/// are flattened in on success.
#[derive(Debug, Serialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: Option<T>,
}

impl<T> CommandResponse<T> {
    pub fn success(message: impl Into<String>, fields: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            fields: Some(fields),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            fields: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BrightnessEcho {
    pub brightness: u8,
}

#[derive(Debug, Serialize)]
pub struct ContrastEcho {
    pub contrast: u8,
}

#[derive(Debug, Serialize)]
pub struct InputEcho {
    pub input: u8,
    pub input_name: &'static str,
}

/// `GET /api/status` body
#[derive(Debug, Serialize, PartialEq)]
pub struct StatusResponse {
    pub brightness: i64,
    pub contrast: i64,
    pub display_index: usize,
    pub nvapi_initialized: bool,
    pub status_message: String,
}

impl From<StatusSnapshot> for StatusResponse {
    fn from(snapshot: StatusSnapshot) -> Self {
        Self {
            brightness: snapshot.brightness as i64,
            contrast: snapshot.contrast as i64,
            display_index: snapshot.selected_display,
            nvapi_initialized: snapshot.hardware_initialized,
            status_message: snapshot.status_message,
        }
    }
}

/// `GET /health` body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
