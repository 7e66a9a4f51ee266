// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

use crate::MountState;

/// How a lifecycle call ended, independent of the text the tool printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    Succeeded,
    /// The tool ran and exited non-zero
    ToolFailed,
    /// The tool could not be started
    LaunchFailed,
    /// Another lifecycle operation was already running
    Busy,
}

impl OperationOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// What the coordinator reports after every lifecycle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub display_text: String,
    pub current_state: MountState,
    pub outcome: OperationOutcome,
}

impl StatusReport {
    pub fn new(
        outcome: OperationOutcome,
        display_text: impl Into<String>,
        current_state: MountState,
    ) -> Self {
        Self {
            display_text: display_text.into(),
            current_state,
            outcome,
        }
    }
}
