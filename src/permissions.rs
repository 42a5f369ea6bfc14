// SPDX-License-Identifier: GPL-3.0-only
//! I2C access diagnostics
//!
//! DDC/CI writes need read/write access to `/dev/i2c-*`. These checks only
//! report; they never change anything on the system.

use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Group, getegid, getgroups};

const I2C_UDEV_RULES: [&str; 2] = [
    "/etc/udev/rules.d/45-i2c-permissions.rules",
    "/usr/lib/udev/rules.d/45-i2c-permissions.rules",
];

#[derive(Debug, Clone)]
pub struct PermissionCheckResult {
    pub requirements: Vec<PermissionRequirement>,
}

#[derive(Debug, Clone)]
pub struct PermissionRequirement {
    pub name: String,
    pub description: String,
    pub status: RequirementStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequirementStatus {
    Met,
    NotMet,
    NotApplicable,
    Partial, // informational, not blocking
}

impl PermissionCheckResult {
    pub fn has_issues(&self) -> bool {
        self.requirements
            .iter()
            .any(|r| r.status == RequirementStatus::NotMet)
    }

    pub fn summary(&self) -> String {
        let not_met = self
            .requirements
            .iter()
            .filter(|r| r.status == RequirementStatus::NotMet)
            .count();

        if not_met == 0 {
            let met_count = self
                .requirements
                .iter()
                .filter(|r| r.status == RequirementStatus::Met)
                .count();
            format!("All {} requirements met", met_count)
        } else {
            format!("{} requirement(s) not met", not_met)
        }
    }

    /// Write the outcome of every check to the log
    pub fn log(&self) {
        for requirement in &self.requirements {
            match requirement.status {
                RequirementStatus::NotMet => {
                    warn!("{}: {}", requirement.name, requirement.description)
                }
                _ => debug!("{}: {}", requirement.name, requirement.description),
            }
        }
        if self.has_issues() {
            warn!("I2C permissions: {}", self.summary());
        } else {
            info!("I2C permissions: {}", self.summary());
        }
    }
}

/// Check if the current user has the necessary permissions to access I2C devices
pub fn check_i2c_permissions() -> PermissionCheckResult {
    let i2c_devices = find_i2c_devices();
    let accessible_count = i2c_devices.iter().filter(|d| can_write(d)).count();
    let in_i2c_group = is_in_i2c_group();
    let rules_installed = I2C_UDEV_RULES.iter().any(|p| Path::new(p).exists());

    evaluate(
        i2c_devices.len(),
        accessible_count,
        in_i2c_group,
        rules_installed,
    )
}

fn evaluate(
    device_count: usize,
    accessible_count: usize,
    in_i2c_group: bool,
    rules_installed: bool,
) -> PermissionCheckResult {
    let mut requirements = Vec::new();

    requirements.push(PermissionRequirement {
        name: "I2C devices".to_string(),
        description: if device_count == 0 {
            "No /dev/i2c-* devices found (is i2c-dev loaded?)".to_string()
        } else {
            format!("Found {} I2C device(s)", device_count)
        },
        status: if device_count == 0 {
            RequirementStatus::NotMet
        } else {
            RequirementStatus::Met
        },
    });

    // DDC/CI needs both read and write
    requirements.push(PermissionRequirement {
        name: "I2C read/write access".to_string(),
        description: if device_count == 0 {
            "N/A".to_string()
        } else if accessible_count == device_count {
            format!("Can access all {} device(s)", accessible_count)
        } else if accessible_count > 0 {
            format!("Can access {}/{} device(s)", accessible_count, device_count)
        } else {
            "Cannot access any I2C devices".to_string()
        },
        status: if device_count == 0 {
            RequirementStatus::NotApplicable
        } else if accessible_count == device_count {
            RequirementStatus::Met
        } else if accessible_count > 0 {
            RequirementStatus::Partial
        } else {
            RequirementStatus::NotMet
        },
    });

    requirements.push(PermissionRequirement {
        name: "i2c group".to_string(),
        description: if in_i2c_group {
            "User is in i2c group".to_string()
        } else {
            "User not in i2c group".to_string()
        },
        status: if in_i2c_group {
            RequirementStatus::Met
        } else {
            RequirementStatus::NotMet
        },
    });

    requirements.push(PermissionRequirement {
        name: "udev rules (I2C)".to_string(),
        description: if rules_installed {
            "I2C udev rules installed".to_string()
        } else {
            "I2C udev rules not found".to_string()
        },
        status: if rules_installed {
            RequirementStatus::Met
        } else {
            RequirementStatus::NotMet
        },
    });

    PermissionCheckResult { requirements }
}

/// Find all I2C device files
fn find_i2c_devices() -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir("/dev") else {
        return Vec::new();
    };

    let mut devices: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("i2c-"))
        .map(|e| e.path())
        .collect();
    devices.sort();
    devices
}

/// Check if we can write to a device
fn can_write(path: &Path) -> bool {
    fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .is_ok()
}

/// Check if the process carries the i2c group
fn is_in_i2c_group() -> bool {
    let group = match Group::from_name("i2c") {
        Ok(Some(group)) => group,
        Ok(None) => {
            debug!("No i2c group on this system");
            return false;
        }
        Err(e) => {
            debug!("Failed to look up i2c group: {}", e);
            return false;
        }
    };

    let supplementary = getgroups().unwrap_or_else(|e| {
        debug!("getgroups failed: {}", e);
        Vec::new()
    });
    carries_group(group.gid, getegid(), &supplementary)
}

fn carries_group(gid: Gid, effective: Gid, supplementary: &[Gid]) -> bool {
    effective == gid || supplementary.contains(&gid)
}
