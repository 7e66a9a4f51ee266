// SPDX-License-Identifier: GPL-3.0-only

use sgfs_types::ToolInvocationResult;

use crate::LifecycleError;

/// Runs the external SGFS tool
///
/// Implementations block until the tool exits. A tool that ran and exited
/// non-zero is an `Ok` result with `succeeded == false`; only a failure to
/// start the tool at all is an `Err`, with kind
/// [`LifecycleErrorKind::ToolLaunch`](crate::LifecycleErrorKind::ToolLaunch).
pub trait ToolInvoker: Send + Sync {
    fn invoke(&self, args: &[String]) -> Result<ToolInvocationResult, LifecycleError>;
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for std::sync::Arc<T> {
    fn invoke(&self, args: &[String]) -> Result<ToolInvocationResult, LifecycleError> {
        (**self).invoke(args)
    }
}
