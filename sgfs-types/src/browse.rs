// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-item outcome of deleting entries under the browse root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<DeleteFailure>,
}

impl DeleteResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
