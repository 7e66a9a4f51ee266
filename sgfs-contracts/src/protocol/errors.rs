// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleErrorKind {
    /// The tool executable is missing or could not be started
    ToolLaunch,
    /// The tool ran and reported failure
    ToolReportedFailure,
    /// Another lifecycle operation is in flight
    Busy,
    /// Removing an entry from the host filesystem failed
    FilesystemDelete,
    InvalidConfig,
    Internal,
}

impl LifecycleErrorKind {
    /// Whether the caller may simply try the same call again later.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Busy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct LifecycleError {
    pub kind: LifecycleErrorKind,
    pub message: String,
}

impl LifecycleError {
    pub fn new(kind: LifecycleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn tool_launch(message: impl Into<String>) -> Self {
        Self::new(LifecycleErrorKind::ToolLaunch, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(LifecycleErrorKind::Busy, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_error_roundtrips() {
        let error = LifecycleError::busy("format is already running");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: LifecycleError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
    }

    #[test]
    fn only_busy_is_retryable() {
        assert!(LifecycleErrorKind::Busy.is_retryable());
        assert!(!LifecycleErrorKind::ToolLaunch.is_retryable());
        assert!(!LifecycleErrorKind::ToolReportedFailure.is_retryable());
        assert!(!LifecycleErrorKind::FilesystemDelete.is_retryable());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = LifecycleError::tool_launch("./sgfs_cli: No such file or directory");
        assert_eq!(
            error.to_string(),
            "ToolLaunch: ./sgfs_cli: No such file or directory"
        );
    }
}
