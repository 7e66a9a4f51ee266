// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Whether an SGFS volume is currently mounted, as last reported by the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted {
        /// Directory the volume's contents appear under
        mount_point: PathBuf,
        /// Disk path that was handed to the tool
        device: PathBuf,
    },
}

impl MountState {
    pub fn is_mounted(&self) -> bool {
        matches!(self, MountState::Mounted { .. })
    }

    pub fn mount_point(&self) -> Option<&Path> {
        match self {
            MountState::Mounted { mount_point, .. } => Some(mount_point),
            MountState::Unmounted => None,
        }
    }

    pub fn device(&self) -> Option<&Path> {
        match self {
            MountState::Mounted { device, .. } => Some(device),
            MountState::Unmounted => None,
        }
    }
}

impl std::fmt::Display for MountState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountState::Unmounted => f.write_str("unmounted"),
            MountState::Mounted {
                mount_point,
                device,
            } => write!(
                f,
                "mounted {} at {}",
                device.display(),
                mount_point.display()
            ),
        }
    }
}
