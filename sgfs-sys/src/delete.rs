// SPDX-License-Identifier: GPL-3.0-only

//! Host filesystem deletion for entries under the browse root

use std::fs;
use std::path::{Path, PathBuf};

use sgfs_types::{DeleteFailure, DeleteResult};
use tracing::{info, warn};

use crate::error::Result;

/// Remove one entry. Directories are removed with their contents.
///
/// Symlinks are removed themselves, never followed.
pub fn remove_entry(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }

    info!("Deleted {:?}", path);
    Ok(())
}

/// Remove every path, collecting a per-item failure instead of stopping
pub fn remove_entries(paths: &[PathBuf]) -> DeleteResult {
    let mut result = DeleteResult::default();

    for path in paths {
        match remove_entry(path) {
            Ok(()) => result.deleted.push(path.clone()),
            Err(e) => {
                warn!("Could not delete {:?}: {}", path, e);
                result.failed.push(DeleteFailure {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    result
}
