// SPDX-License-Identifier: GPL-3.0-only

//! Mount lifecycle coordination for SGFS volumes
//!
//! The [`Coordinator`] owns the mount state and is the only thing allowed to
//! change it. It runs one lifecycle operation at a time through a
//! [`ToolInvoker`](sgfs_contracts::ToolInvoker) and folds every tool outcome
//! into a [`StatusReport`](sgfs_types::StatusReport).
//!
//! [`BrowseRoot`] derives the directory a browsing view should show from
//! that state, so a view can never be rooted somewhere the last lifecycle
//! result does not justify.
//!
//! Coordinator calls block on the child process. [`LifecycleHandle`] moves
//! them onto tokio's blocking pool for async front-ends.

pub mod args;
pub mod browse;
pub mod config;
pub mod coordinator;
pub mod handle;

pub use args::{FormatGeometry, ToolArguments};
pub use browse::BrowseRoot;
pub use config::{ConfigError, LifecycleConfig, UnmountPolicy};
pub use coordinator::{Coordinator, Precondition};
pub use handle::LifecycleHandle;
