// SPDX-License-Identifier: GPL-3.0-only

//! Browse-root derivation and deletion under the root
//!
//! The root is recomputed from the mount state on every call and never
//! stored, so a view that asks after each lifecycle call always matches the
//! coordinator's last result.
//!
//! Anything strictly below the root may be deleted. There is no list of
//! protected paths: with the default `/` fallback root, everything on the
//! host is deletable. Callers should confirm before calling [`BrowseRoot::delete`].

use std::fs;
use std::path::{Component, Path, PathBuf};

use sgfs_types::{DeleteFailure, DeleteResult, MountState};
use tracing::{debug, warn};

use crate::config::LifecycleConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRoot {
    fallback_root: PathBuf,
}

impl BrowseRoot {
    pub fn new(fallback_root: impl Into<PathBuf>) -> Self {
        Self {
            fallback_root: fallback_root.into(),
        }
    }

    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self::new(&config.fallback_root)
    }

    pub fn fallback_root(&self) -> &Path {
        &self.fallback_root
    }

    /// Directory a browsing view should be rooted at for `state`
    pub fn current_browse_root(&self, state: &MountState) -> PathBuf {
        normalize(state.mount_point().unwrap_or(self.fallback_root.as_path()))
    }

    /// Whether `path` lies strictly below the current root
    ///
    /// Relative paths are taken relative to the root. `..` components are
    /// resolved lexically, so they cannot climb out of it.
    pub fn can_delete(&self, state: &MountState, path: &Path) -> bool {
        let root = self.current_browse_root(state);
        let candidate = normalize(&root.join(path));
        candidate != root && candidate.starts_with(&root)
    }

    /// Delete every permitted path, reporting failures per item
    ///
    /// A path must pass [`can_delete`](Self::can_delete) and its parent must
    /// still resolve inside the root once symlinks are followed. The entry
    /// itself is not resolved, so a symlink is removed as a link.
    pub fn delete(&self, state: &MountState, paths: &[PathBuf]) -> DeleteResult {
        let root = self.current_browse_root(state);
        let mut permitted = Vec::with_capacity(paths.len());
        let mut refused = Vec::new();

        for path in paths {
            let target = normalize(&root.join(path));
            let verdict = if self.can_delete(state, path) {
                resolves_inside(&root, &target)
            } else {
                Err(format!("outside browse root {}", root.display()))
            };

            match verdict {
                Ok(()) => {
                    debug!("Deleting {:?} under {:?}", target, root);
                    permitted.push(target);
                }
                Err(reason) => {
                    warn!("Refusing to delete {:?}: {}", path, reason);
                    refused.push(DeleteFailure {
                        path: path.clone(),
                        reason,
                    });
                }
            }
        }

        let mut result = sgfs_sys::remove_entries(&permitted);
        result.failed.extend(refused);
        result
    }
}

/// Check that `target`'s parent, with symlinks resolved, is still under `root`
fn resolves_inside(root: &Path, target: &Path) -> Result<(), String> {
    let root = fs::canonicalize(root)
        .map_err(|e| format!("cannot resolve browse root {}: {e}", root.display()))?;
    let Some(parent) = target.parent() else {
        return Err(format!("outside browse root {}", root.display()));
    };
    let parent = fs::canonicalize(parent)
        .map_err(|e| format!("cannot resolve {}: {e}", parent.display()))?;

    if parent.starts_with(&root) {
        Ok(())
    } else {
        Err(format!(
            "outside browse root {}: resolves to {}",
            root.display(),
            parent.display()
        ))
    }
}

/// Lexical normalization: drops `.`, applies `..` without touching the disk
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
