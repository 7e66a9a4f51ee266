// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data model for SGFS volume management
//!
//! These types are shared by the lifecycle coordinator and every front-end:
//!
//! - **sgfs-sys**: produces `ToolInvocationResult` and `DeleteResult`
//! - **sgfs-lifecycle**: owns `MountState` and emits `StatusReport`
//! - **sgfs-manager**: renders whatever the coordinator reports
//!
//! Nothing here carries behaviour beyond small accessors; state transitions
//! live in the coordinator.

pub mod browse;
pub mod lifecycle;
pub mod mount;
pub mod status;
pub mod tool;

pub use browse::{DeleteFailure, DeleteResult};
pub use lifecycle::{BackupOptions, LifecycleKind, LifecycleRequest};
pub use mount::MountState;
pub use status::{OperationOutcome, StatusReport};
pub use tool::ToolInvocationResult;
