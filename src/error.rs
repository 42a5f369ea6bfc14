// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the application
//!
//! `ControlError` covers everything the display control facade can refuse or
//! fail at; `ApiError` covers bringing the HTTP API up.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure of a display control operation
#[derive(Error, Debug)]
pub enum ControlError {
    /// Level outside the 0-100 range accepted by the monitor
    #[error("{feature} must be between 0 and 100, got {value}")]
    OutOfRange { feature: &'static str, value: f32 },

    /// Input source selector not present in the mapping table
    #[error("Unknown input source {0}")]
    UnknownInputSource(i64),

    /// No display has been initialized for DDC/CI control
    #[error("Display control not initialized")]
    NotInitialized,

    /// Display index outside the enumerated range
    #[error("Display {index} not found ({count} available)")]
    DisplayNotFound { index: usize, count: usize },

    /// Display discovery failed or found nothing
    #[error("Display initialization failed: {0}")]
    Initialization(String),

    /// The DDC/CI write itself failed
    #[error("DDC/CI write failed while {operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ControlError {
    /// True for errors caused by the caller's input rather than the hardware
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ControlError::OutOfRange { .. } | ControlError::UnknownInputSource(_)
        )
    }
}

/// Failure to start the HTTP API
#[derive(Error, Debug)]
pub enum ApiError {
    /// `start` called while the server is already up
    #[error("HTTP API server is already running")]
    AlreadyRunning,

    /// The configuration disables the API
    #[error("HTTP API is disabled in the configuration")]
    Disabled,

    /// The listener thread could not be created
    #[error("Failed to spawn HTTP API thread: {0}")]
    Spawn(#[source] io::Error),

    /// The worker's async runtime could not be built
    #[error("Failed to build HTTP API runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The listener could not claim the configured address
    #[error("Failed to bind HTTP API to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// No bind report arrived within the start-up window
    #[error("HTTP API did not report a bind result within {0:?}")]
    StartTimeout(Duration),

    /// The listener thread exited before reporting
    #[error("HTTP API thread exited before reporting its bind result")]
    WorkerExited,
}

/// Result type alias for ControlError
pub type Result<T> = std::result::Result<T, ControlError>;
