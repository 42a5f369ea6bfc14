// SPDX-License-Identifier: GPL-3.0-only
//! Device-specific configurations organized by manufacturer

pub mod lg;

/// One entry of a monitor's input source table
///
/// Input switching is vendor specific: the selector exposed to users is
/// translated into the raw bytes the monitor expects on the DDC/CI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSource {
    /// Selector exposed through the panel and HTTP API (1-based)
    pub selector: u8,

    /// Human-readable input name
    pub name: &'static str,

    /// Value byte written to the monitor
    pub input_value: u8,

    /// VCP or vendor command code
    pub command_code: u8,

    /// Host sub-address the command is written to
    pub register_address: u8,
}

/// Input source table used for input switching
pub const INPUT_SOURCES: &[InputSource] = &lg::ultragear::INPUT_SOURCES;

/// Look up an input source by its selector
pub fn input_source(selector: i64) -> Option<&'static InputSource> {
    INPUT_SOURCES
        .iter()
        .find(|source| i64::from(source.selector) == selector)
}

/// Lowest and highest valid selector
pub fn selector_range() -> (u8, u8) {
    let min = INPUT_SOURCES.iter().map(|s| s.selector).min().unwrap_or(1);
    let max = INPUT_SOURCES.iter().map(|s| s.selector).max().unwrap_or(1);
    (min, max)
}

/// Human-readable list of selectors, e.g. `1=HDMI 1, 2=HDMI 2`
pub fn describe_input_sources() -> String {
    INPUT_SOURCES
        .iter()
        .map(|source| format!("{}={}", source.selector, source.name))
        .collect::<Vec<_>>()
        .join(", ")
}
