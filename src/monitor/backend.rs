// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;

/// Transport target of one display
///
/// Only meaningful while the display it was discovered for is still
/// attached to the same I2C adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTarget {
    /// `/dev/i2c-N` node of the adapter the display hangs off
    pub adapter: PathBuf,
    /// Bus number `N`, doubles as the output id
    pub bus: u32,
    /// Adapter name reported by the kernel
    pub name: String,
}

impl DisplayTarget {
    pub fn new(bus: u32, name: impl Into<String>) -> Self {
        Self {
            adapter: PathBuf::from(format!("/dev/i2c-{bus}")),
            bus,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.adapter.display())
    }
}
