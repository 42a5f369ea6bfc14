// SPDX-License-Identifier: GPL-3.0-only
//! Thread-safe display control
//!
//! [`MonitorControl`] is the only way to read or change the display state.
//! The terminal panel and the HTTP API share one instance through an `Arc`.
//!
//! # Thread Safety
//!
//! A single `Mutex` guards both the [`DisplayState`] and the transport, and
//! every operation holds it for its full duration, including the hardware
//! write. State and hardware therefore never disagree, and all mutations are
//! totally ordered. Reads wait for an in-flight write to finish. No timeout
//! is applied here: a hung transport blocks every later caller.

mod state;

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use state::{DisplayState, StatusSnapshot};

use crate::devices::{self, InputSource};
use crate::error::{ControlError, Result};
use crate::monitor::DisplayTarget;
use crate::protocols::DdcTransport;
use crate::protocols::ddc_ci::{VCP_REGISTER, VcpFeature};

/// Brightness/contrast combinations offered by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Bright,
    Normal,
    Dark,
}

impl Preset {
    /// `(brightness, contrast)` of the preset
    pub const fn levels(self) -> (f32, f32) {
        match self {
            Preset::Bright => (80.0, 75.0),
            Preset::Normal => (50.0, 50.0),
            Preset::Dark => (20.0, 40.0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Preset::Bright => "Bright",
            Preset::Normal => "Normal",
            Preset::Dark => "Dark",
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bright" => Ok(Preset::Bright),
            "normal" => Ok(Preset::Normal),
            "dark" => Ok(Preset::Dark),
            other => Err(format!("unknown preset '{other}' (bright, normal, dark)")),
        }
    }
}

fn check_level(feature: VcpFeature, value: f32) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ControlError::OutOfRange {
            feature: feature.label(),
            value,
        })
    }
}

struct Inner {
    state: DisplayState,
    transport: Box<dyn DdcTransport>,
}

impl Inner {
    fn write_level(&mut self, feature: VcpFeature, value: f32) -> Result<()> {
        let Inner { state, transport } = self;

        if !state.hardware_initialized {
            return Err(ControlError::NotInitialized);
        }
        let target = state
            .current_target
            .clone()
            .ok_or(ControlError::NotInitialized)?;

        // Monitors take whole percent; fractions are truncated
        let level = value as u8;
        match transport.write_value(&target, level, feature.code(), VCP_REGISTER) {
            Ok(()) => {
                match feature {
                    VcpFeature::Brightness => state.brightness = value,
                    VcpFeature::Contrast => state.contrast = value,
                }
                state.set_status(format!("{} set to {}%", feature.label(), level));
                info!(display = %target, "{} set to {}%", feature.label(), level);
                Ok(())
            }
            Err(source) => {
                state.set_status(format!(
                    "Failed to set {}",
                    feature.label().to_ascii_lowercase()
                ));
                warn!(display = %target, error = %source, "Failed to set {}", feature.label());
                Err(ControlError::Transport {
                    operation: format!("setting {}", feature.label().to_ascii_lowercase()),
                    source,
                })
            }
        }
    }

    fn select(&mut self, index: usize) -> Result<()> {
        let count = self.state.display_count();
        let target = self
            .state
            .displays
            .get(index)
            .cloned()
            .ok_or(ControlError::DisplayNotFound { index, count })?;

        info!("Selected display {}: {}", index, target);
        self.state.current_target = Some(target);
        self.state.selected_display = index;
        self.state.set_status(format!("Selected display {index}"));
        Ok(())
    }
}

/// Serialized access to the display state and the DDC/CI transport
pub struct MonitorControl {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for MonitorControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorControl")
            .field("state", &self.lock().state)
            .finish_non_exhaustive()
    }
}

impl MonitorControl {
    /// Create an uninitialized control around a transport
    pub fn new(transport: Box<dyn DdcTransport>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: DisplayState::default(),
                transport,
            }),
        }
    }

    /// Poisoning is ignored: fields are only ever replaced whole.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discover displays and select the first one
    ///
    /// `discover` runs under the lock, so no command can observe a half
    /// initialized state. Returns the number of displays found.
    pub fn initialize<F>(&self, discover: F) -> Result<usize>
    where
        F: FnOnce() -> anyhow::Result<Vec<DisplayTarget>>,
    {
        let mut inner = self.lock();

        let displays = match discover() {
            Ok(displays) => displays,
            Err(e) => {
                error!("Display enumeration failed: {:#}", e);
                inner.state.hardware_initialized = false;
                inner.state.set_status(format!("Display enumeration failed: {e}"));
                return Err(ControlError::Initialization(e.to_string()));
            }
        };

        if displays.is_empty() {
            warn!("No DDC/CI displays found");
            inner.state.hardware_initialized = false;
            inner.state.set_status("No DDC/CI displays found");
            return Err(ControlError::Initialization(
                "no DDC/CI displays found".to_string(),
            ));
        }

        let count = displays.len();
        inner.state.displays = displays;
        inner.select(0)?;
        inner.state.hardware_initialized = true;
        info!("Display control initialized with {} display(s)", count);

        Ok(count)
    }

    /// Switch the transport target to another enumerated display
    pub fn select_display(&self, index: usize) -> Result<()> {
        self.lock().select(index)
    }

    /// Set brightness (0-100)
    pub fn set_brightness(&self, value: f32) -> Result<()> {
        self.set_level(VcpFeature::Brightness, value)
    }

    /// Set contrast (0-100)
    pub fn set_contrast(&self, value: f32) -> Result<()> {
        self.set_level(VcpFeature::Contrast, value)
    }

    /// Write a continuous VCP level
    ///
    /// Out-of-range values are rejected before the lock is taken; they never
    /// touch the state or the transport.
    pub fn set_level(&self, feature: VcpFeature, value: f32) -> Result<()> {
        check_level(feature, value)?;
        self.lock().write_level(feature, value)
    }

    /// Switch the monitor input
    ///
    /// Only the status message records the switch; the active input is not
    /// tracked since monitors can change it on their own.
    pub fn set_input_source(&self, selector: i64) -> Result<&'static InputSource> {
        let source =
            devices::input_source(selector).ok_or(ControlError::UnknownInputSource(selector))?;

        let mut inner = self.lock();
        let Inner { state, transport } = &mut *inner;

        if !state.hardware_initialized {
            return Err(ControlError::NotInitialized);
        }
        let target = state
            .current_target
            .clone()
            .ok_or(ControlError::NotInitialized)?;

        match transport.write_value(
            &target,
            source.input_value,
            source.command_code,
            source.register_address,
        ) {
            Ok(()) => {
                state.set_status(format!("Input switched to {}", source.name));
                info!(display = %target, "Input switched to {}", source.name);
                Ok(source)
            }
            Err(e) => {
                state.set_status(format!("Failed to switch to {}", source.name));
                warn!(display = %target, error = %e, "Failed to switch input to {}", source.name);
                Err(ControlError::Transport {
                    operation: format!("switching input to {}", source.name),
                    source: e,
                })
            }
        }
    }

    /// Apply a preset; stops at the first failing write
    pub fn apply_preset(&self, preset: Preset) -> Result<()> {
        let (brightness, contrast) = preset.levels();

        let mut inner = self.lock();
        inner.write_level(VcpFeature::Brightness, brightness)?;
        inner.write_level(VcpFeature::Contrast, contrast)?;
        inner.state.set_status(format!(
            "{} preset applied (brightness {:.0}%, contrast {:.0}%)",
            preset.name(),
            brightness,
            contrast
        ));
        Ok(())
    }

    pub fn brightness(&self) -> f32 {
        self.lock().state.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.lock().state.contrast
    }

    pub fn selected_display(&self) -> usize {
        self.lock().state.selected_display
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().state.hardware_initialized
    }

    pub fn status_message(&self) -> String {
        self.lock().state.status_message.clone()
    }

    /// Enumerated displays, in index order
    pub fn displays(&self) -> Vec<DisplayTarget> {
        self.lock().state.displays.clone()
    }

    /// All status fields read under one lock acquisition
    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().state.snapshot()
    }
}
