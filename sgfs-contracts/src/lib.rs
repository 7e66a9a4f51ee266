// SPDX-License-Identifier: GPL-3.0-only

pub mod protocol;
pub mod traits;

pub use protocol::{LifecycleError, LifecycleErrorKind, OperationId};
pub use traits::ToolInvoker;
