// SPDX-License-Identifier: GPL-3.0-only
mod backend;
mod enumeration;

pub use backend::DisplayTarget;
pub use enumeration::enumerate_displays;
