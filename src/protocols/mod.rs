// SPDX-License-Identifier: GPL-3.0-only
//! Display control protocols
//!
//! The control facade talks to hardware exclusively through [`DdcTransport`],
//! a single blocking "write one value" primitive. The Linux implementation
//! lives in [`ddc_ci`].

pub mod ddc_ci;

use anyhow::Result;

use crate::monitor::DisplayTarget;

/// Hardware transport for DDC/CI writes
pub trait DdcTransport: std::fmt::Debug + Send {
    /// Write `value` for `command_code` to `register_address` on the display
    ///
    /// Blocks until the bus transaction completes.
    fn write_value(
        &mut self,
        target: &DisplayTarget,
        value: u8,
        command_code: u8,
        register_address: u8,
    ) -> Result<()>;
}
