// SPDX-License-Identifier: GPL-3.0-only
//! DDC/CI (Display Data Channel Command Interface) protocol implementation
//!
//! DDC/CI is a standard protocol for controlling monitors over I2C bus.
//! It's supported by most modern external monitors via the video cable.
//!
//! Writes go straight to the Linux `i2c-dev` character devices. Unlike the
//! usual VCP helpers this lets the caller pick the host sub-address, which
//! some vendors (LG input switching on 0x50) require.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};

use super::DdcTransport;
use crate::monitor::DisplayTarget;

/// 7-bit I2C address of the DDC/CI command interface
pub const DDC_CI_ADDRESS: u16 = 0x37;

/// 7-bit I2C address of the EDID EEPROM
pub const EDID_ADDRESS: u16 = 0x50;

/// Standard host sub-address for VCP commands
pub const VCP_REGISTER: u8 = 0x51;

/// 0x80 | payload length (4 bytes for "set VCP feature")
const SET_VCP_LENGTH: u8 = 0x84;

/// "Set VCP feature" opcode
const SET_VCP_OPCODE: u8 = 0x03;

/// DDC/CI requires at least 40ms between commands
const COMMAND_SPACING: Duration = Duration::from_millis(50);

const EDID_HEADER: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

/// Continuous VCP features the control facade writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcpFeature {
    Brightness,
    Contrast,
}

impl VcpFeature {
    /// VCP code of the feature
    pub const fn code(self) -> u8 {
        match self {
            VcpFeature::Brightness => 0x10,
            VcpFeature::Contrast => 0x12,
        }
    }

    /// Capitalized name used in status messages
    pub const fn label(self) -> &'static str {
        match self {
            VcpFeature::Brightness => "Brightness",
            VcpFeature::Contrast => "Contrast",
        }
    }
}

/// Build the "set VCP feature" packet written after the slave address
///
/// Layout: sub-address, length, opcode, code, value high byte, value low
/// byte, checksum. The checksum XORs the 8-bit write address (0x6E) with
/// every preceding byte.
pub fn encode_set_vcp(register_address: u8, command_code: u8, value: u8) -> [u8; 7] {
    let mut packet = [
        register_address,
        SET_VCP_LENGTH,
        SET_VCP_OPCODE,
        command_code,
        0x00,
        value,
        0x00,
    ];
    let write_address = (DDC_CI_ADDRESS << 1) as u8;
    packet[6] = packet[..6]
        .iter()
        .fold(write_address, |checksum, byte| checksum ^ byte);
    packet
}

/// Check whether an EDID EEPROM answers on the given adapter
pub fn has_edid(path: &Path) -> Result<bool, LinuxI2CError> {
    let mut dev = LinuxI2CDevice::new(path, EDID_ADDRESS)?;
    dev.write(&[0x00])?;

    let mut header = [0u8; 8];
    dev.read(&mut header)?;
    Ok(header == EDID_HEADER)
}

/// DDC/CI transport over Linux `i2c-dev`
///
/// Keeps one device per adapter, bound to the DDC/CI slave; a device is
/// dropped after a failed write so the next attempt reopens it.
#[derive(Default)]
pub struct I2cDevTransport {
    devices: HashMap<PathBuf, LinuxI2CDevice>,
}

impl std::fmt::Debug for I2cDevTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I2cDevTransport")
            .field("adapters", &self.devices.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl I2cDevTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn device(&mut self, target: &DisplayTarget) -> Result<&mut LinuxI2CDevice> {
        if !self.devices.contains_key(&target.adapter) {
            let dev = LinuxI2CDevice::new(&target.adapter, DDC_CI_ADDRESS).with_context(|| {
                format!("failed to open {} for DDC/CI", target.adapter.display())
            })?;
            self.devices.insert(target.adapter.clone(), dev);
        }
        self.devices
            .get_mut(&target.adapter)
            .context("I2C device missing after open")
    }
}

impl DdcTransport for I2cDevTransport {
    fn write_value(
        &mut self,
        target: &DisplayTarget,
        value: u8,
        command_code: u8,
        register_address: u8,
    ) -> Result<()> {
        let packet = encode_set_vcp(register_address, command_code, value);
        let dev = self.device(target)?;

        if let Err(e) = dev.write(&packet) {
            self.devices.remove(&target.adapter);
            return Err(e).with_context(|| {
                format!("I2C write to {} failed", target.adapter.display())
            });
        }

        debug!(
            adapter = %target.adapter.display(),
            register = %format!("{register_address:#04x}"),
            code = %format!("{command_code:#04x}"),
            value,
            "DDC/CI write complete"
        );

        std::thread::sleep(COMMAND_SPACING);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_packet() {
        // 0x6E ^ 0x51 ^ 0x84 ^ 0x03 ^ 0x10 ^ 0x00 ^ 0x32 = 0x9A
        let packet = encode_set_vcp(VCP_REGISTER, VcpFeature::Brightness.code(), 50);
        assert_eq!(packet, [0x51, 0x84, 0x03, 0x10, 0x00, 0x32, 0x9A]);
    }

    #[test]
    fn test_checksum_covers_all_bytes() {
        let packet = encode_set_vcp(0x50, 0xF4, 0x90);
        let folded = packet.iter().fold(0x6Eu8, |acc, b| acc ^ b);
        assert_eq!(folded, 0);
    }

    #[test]
    fn test_feature_codes() {
        assert_eq!(VcpFeature::Brightness.code(), 0x10);
        assert_eq!(VcpFeature::Contrast.code(), 0x12);
        assert_eq!(VcpFeature::Contrast.label(), "Contrast");
    }

    #[test]
    fn test_missing_adapter_fails() {
        let mut transport = I2cDevTransport::new();
        let target = DisplayTarget {
            adapter: PathBuf::from("/nonexistent/i2c-99"),
            bus: 99,
            name: "missing".to_string(),
        };
        assert!(transport.write_value(&target, 50, 0x10, VCP_REGISTER).is_err());
        assert!(transport.devices.is_empty());
    }

    #[test]
    fn test_edid_check_on_missing_adapter() {
        assert!(has_edid(Path::new("/nonexistent/i2c-99")).is_err());
    }
}
