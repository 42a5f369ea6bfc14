// SPDX-License-Identifier: GPL-3.0-only
use crate::monitor::DisplayTarget;

pub const DEFAULT_LEVEL: f32 = 50.0;
pub const INITIAL_STATUS: &str = "Ready";

/// Everything the panel and the HTTP API know about the controlled display
///
/// Only [`super::MonitorControl`] holds one of these, behind its lock.
#[derive(Debug, Clone)]
pub struct DisplayState {
    /// Between 0 and 100
    pub brightness: f32,
    /// Between 0 and 100
    pub contrast: f32,
    pub selected_display: usize,
    pub displays: Vec<DisplayTarget>,
    pub hardware_initialized: bool,
    /// Outcome of the last completed operation
    pub status_message: String,
    /// Target of transport writes, `Some` once a display is selected
    pub current_target: Option<DisplayTarget>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_LEVEL,
            contrast: DEFAULT_LEVEL,
            selected_display: 0,
            displays: Vec::new(),
            hardware_initialized: false,
            status_message: INITIAL_STATUS.to_string(),
            current_target: None,
        }
    }
}

impl DisplayState {
    pub fn display_count(&self) -> usize {
        self.displays.len()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            brightness: self.brightness,
            contrast: self.contrast,
            selected_display: self.selected_display,
            display_count: self.display_count(),
            hardware_initialized: self.hardware_initialized,
            status_message: self.status_message.clone(),
        }
    }
}

/// Consistent copy of the display state, taken under a single lock
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub brightness: f32,
    pub contrast: f32,
    pub selected_display: usize,
    pub display_count: usize,
    pub hardware_initialized: bool,
    pub status_message: String,
}
