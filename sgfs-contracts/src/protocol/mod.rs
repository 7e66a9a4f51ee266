// SPDX-License-Identifier: GPL-3.0-only

pub mod errors;
pub mod ids;

pub use errors::{LifecycleError, LifecycleErrorKind};
pub use ids::OperationId;
