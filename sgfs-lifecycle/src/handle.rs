// SPDX-License-Identifier: GPL-3.0-only

//! Async facade over the blocking coordinator
//!
//! Every lifecycle call waits for the external tool. The handle runs those
//! calls on tokio's blocking pool so an interactive front-end keeps
//! servicing input while the tool runs. The busy rule is still enforced by
//! the coordinator itself, so two handles sharing one coordinator cannot
//! race.

use std::path::PathBuf;
use std::sync::Arc;

use sgfs_contracts::{LifecycleError, LifecycleErrorKind, ToolInvoker};
use sgfs_sys::SgfsCli;
use sgfs_types::{DeleteResult, LifecycleRequest, MountState, StatusReport};

use crate::browse::BrowseRoot;
use crate::config::LifecycleConfig;
use crate::coordinator::{Coordinator, Precondition};

pub struct LifecycleHandle<I = SgfsCli> {
    coordinator: Arc<Coordinator<I>>,
    browse: BrowseRoot,
}

impl<I> Clone for LifecycleHandle<I> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            browse: self.browse.clone(),
        }
    }
}

impl LifecycleHandle<SgfsCli> {
    /// Handle driving the real tool, after validating `config`
    pub fn from_config(config: &LifecycleConfig) -> Result<Self, LifecycleError> {
        config.validate()?;
        Ok(Self::new(
            Coordinator::from_config(config),
            BrowseRoot::from_config(config),
        ))
    }
}

impl<I: ToolInvoker + 'static> LifecycleHandle<I> {
    pub fn new(coordinator: Coordinator<I>, browse: BrowseRoot) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            browse,
        }
    }

    pub fn coordinator(&self) -> &Coordinator<I> {
        &self.coordinator
    }

    pub fn state(&self) -> MountState {
        self.coordinator.state()
    }

    /// Root for a browsing view, derived from the current state
    pub fn browse_root(&self) -> PathBuf {
        self.browse.current_browse_root(&self.coordinator.state())
    }

    pub fn preconditions(&self, request: &LifecycleRequest) -> Vec<Precondition> {
        self.coordinator.preconditions(request)
    }

    pub async fn execute(&self, request: LifecycleRequest) -> Result<StatusReport, LifecycleError> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::task::spawn_blocking(move || coordinator.execute(request))
            .await
            .map_err(|e| worker_failed("lifecycle", e))?
    }

    /// The tool's own answer to "which disk is mounted"
    pub async fn query_mounted(&self) -> Result<StatusReport, LifecycleError> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::task::spawn_blocking(move || coordinator.query_mounted())
            .await
            .map_err(|e| worker_failed("query", e))?
    }

    /// Delete entries under the current browse root
    pub async fn delete(&self, paths: Vec<PathBuf>) -> Result<DeleteResult, LifecycleError> {
        let browse = self.browse.clone();
        let state = self.coordinator.state();
        tokio::task::spawn_blocking(move || browse.delete(&state, &paths))
            .await
            .map_err(|e| worker_failed("delete", e))
    }
}

fn worker_failed(what: &str, error: tokio::task::JoinError) -> LifecycleError {
    LifecycleError::new(
        LifecycleErrorKind::Internal,
        format!("{what} worker failed: {error}"),
    )
}
