// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for SGFS management
//!
//! This crate holds everything that touches the host directly:
//! - Running the external `sgfs_cli` tool
//! - Deleting entries under the browse root
//! - Reading the kernel mount table
//!
//! All calls are blocking. Async callers should move them onto a blocking
//! worker (sgfs-lifecycle does this for lifecycle operations).

pub mod cli;
pub mod delete;
pub mod error;
pub mod mounts;

pub use cli::{DEFAULT_TOOL_PATH, SgfsCli};
pub use delete::{remove_entries, remove_entry};
pub use error::{Result, SysError};
pub use mounts::is_mounted;
