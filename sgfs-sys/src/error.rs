// SPDX-License-Identifier: GPL-3.0-only

use sgfs_contracts::{LifecycleError, LifecycleErrorKind};
use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SGFS tool not found: {0}")]
    ToolNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to start SGFS tool {path}: {reason}")]
    Spawn { path: String, reason: String },
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;

impl From<SysError> for LifecycleError {
    fn from(error: SysError) -> Self {
        let kind = match error {
            SysError::ToolNotFound(_) | SysError::Spawn { .. } | SysError::PermissionDenied(_) => {
                LifecycleErrorKind::ToolLaunch
            }
            SysError::Io(_) => LifecycleErrorKind::FilesystemDelete,
        };
        LifecycleError::new(kind, error.to_string())
    }
}
