// SPDX-License-Identifier: GPL-3.0-only
//! LG UltraGear input switching
//!
//! UltraGear monitors ignore the standard input select VCP code (0x60).
//! They switch inputs through the vendor command 0xF4 written to host
//! sub-address 0x50 instead of the usual 0x51.

use crate::devices::InputSource;

/// LG vendor command code for input switching
pub const INPUT_COMMAND: u8 = 0xF4;

/// Host sub-address LG expects input switching on
pub const INPUT_REGISTER: u8 = 0x50;

pub const INPUT_SOURCES: [InputSource; 4] = [
    InputSource {
        selector: 1,
        name: "HDMI 1",
        input_value: 0x90,
        command_code: INPUT_COMMAND,
        register_address: INPUT_REGISTER,
    },
    InputSource {
        selector: 2,
        name: "HDMI 2",
        input_value: 0x91,
        command_code: INPUT_COMMAND,
        register_address: INPUT_REGISTER,
    },
    InputSource {
        selector: 3,
        name: "DisplayPort",
        input_value: 0xD0,
        command_code: INPUT_COMMAND,
        register_address: INPUT_REGISTER,
    },
    InputSource {
        selector: 4,
        name: "USB-C",
        input_value: 0xD1,
        command_code: INPUT_COMMAND,
        register_address: INPUT_REGISTER,
    },
];
