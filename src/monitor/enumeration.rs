// SPDX-License-Identifier: GPL-3.0-only
use anyhow::{Context, Result};

use crate::protocols::ddc_ci;

use super::backend::DisplayTarget;

/// Parse the bus number out of an `i2c-N` sysname
fn bus_number(sysname: &str) -> Option<u32> {
    sysname.strip_prefix("i2c-")?.parse().ok()
}

/// Enumerate I2C adapters that have a display attached
///
/// Walks the `i2c-dev` subsystem through udev and keeps adapters whose EDID
/// EEPROM answers. Results are ordered by bus number so display indices are
/// stable between runs on the same machine.
pub fn enumerate_displays() -> Result<Vec<DisplayTarget>> {
    let mut enumerator = udev::Enumerator::new().context("failed to create udev enumerator")?;
    enumerator
        .match_subsystem("i2c-dev")
        .context("failed to filter udev on i2c-dev")?;

    let mut displays = Vec::new();

    for device in enumerator
        .scan_devices()
        .context("failed to scan i2c-dev devices")?
    {
        let sysname = device.sysname().to_string_lossy().into_owned();
        let Some(bus) = bus_number(&sysname) else {
            debug!("Skipping unexpected i2c-dev entry {}", sysname);
            continue;
        };

        let name = device
            .attribute_value("name")
            .map(|n| n.to_string_lossy().trim().to_string())
            .unwrap_or_else(|| sysname.clone());

        let mut target = DisplayTarget::new(bus, name);
        if let Some(node) = device.devnode() {
            target.adapter = node.to_path_buf();
        }

        match ddc_ci::has_edid(&target.adapter) {
            Ok(true) => {
                info!("Found display on {}", target);
                displays.push(target);
            }
            Ok(false) => {
                debug!("No EDID on {}, skipping", target);
            }
            Err(e) => {
                debug!("EDID read failed on {}: {}", target, e);
            }
        }
    }

    displays.sort_by_key(|d| d.bus);
    info!("=== Found {} display(s) with EDID ===", displays.len());

    Ok(displays)
}
