// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle request descriptors
//!
//! A request is built per user action and consumed immediately by the
//! coordinator; nothing retains it afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    Mount,
    Unmount,
    Format,
    Backup,
    Revert,
    /// Read-only "which disk is mounted" question to the tool
    Query,
}

impl LifecycleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::Unmount => "unmount",
            Self::Format => "format",
            Self::Backup => "backup",
            Self::Revert => "revert",
            Self::Query => "query",
        }
    }

    /// Whether a successful run of this kind can change the mount state.
    pub fn touches_mount_state(self) -> bool {
        matches!(self, Self::Mount | Self::Unmount)
    }
}

impl std::fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem and partition table labels recorded in a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupOptions {
    /// Directory the tool writes the timestamped backup file into
    pub backup_dir: PathBuf,
    /// Filesystem label, e.g. `ext4`
    pub filesystem: String,
    /// Partition table label, e.g. `gpt`
    pub partition_table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleRequest {
    Mount {
        disk: PathBuf,
    },
    Unmount,
    Format {
        disk: PathBuf,
    },
    Backup {
        disk: PathBuf,
        options: BackupOptions,
    },
    Revert {
        disk: PathBuf,
        backup_file: PathBuf,
    },
}

impl LifecycleRequest {
    pub fn kind(&self) -> LifecycleKind {
        match self {
            Self::Mount { .. } => LifecycleKind::Mount,
            Self::Unmount => LifecycleKind::Unmount,
            Self::Format { .. } => LifecycleKind::Format,
            Self::Backup { .. } => LifecycleKind::Backup,
            Self::Revert { .. } => LifecycleKind::Revert,
        }
    }

    /// Disk path the request targets; absent only for unmount.
    pub fn target_disk(&self) -> Option<&Path> {
        match self {
            Self::Mount { disk }
            | Self::Format { disk }
            | Self::Backup { disk, .. }
            | Self::Revert { disk, .. } => Some(disk),
            Self::Unmount => None,
        }
    }
}
