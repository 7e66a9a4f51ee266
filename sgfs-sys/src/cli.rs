// SPDX-License-Identifier: GPL-3.0-only

//! Wrapper around the `sgfs_cli` command-line tool

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use sgfs_contracts::{LifecycleError, ToolInvoker};
use sgfs_types::ToolInvocationResult;
use tracing::{debug, info, warn};
use which::which;

use crate::error::{Result, SysError};

/// Where the tool is expected when nothing else is configured
pub const DEFAULT_TOOL_PATH: &str = "./sgfs_cli";

/// Blocking process invoker for the SGFS tool
#[derive(Debug, Clone)]
pub struct SgfsCli {
    /// Configured executable, either a bare name or a path
    tool_path: PathBuf,
}

impl SgfsCli {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Resolve the executable to run
    ///
    /// Bare names go through `PATH`; anything with a separator is used as is,
    /// relative to the working directory. Resolution happens per call so a
    /// tool installed after startup is picked up.
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        if self.tool_path.components().count() > 1 {
            return Ok(self.tool_path.clone());
        }

        which(&self.tool_path)
            .map_err(|e| SysError::ToolNotFound(format!("{}: {e}", self.tool_path.display())))
    }

    /// Run the tool with exactly `args` and wait for it to exit
    pub fn run(&self, args: &[String]) -> Result<ToolInvocationResult> {
        let binary = self.resolve_binary()?;
        debug!("Running {:?} with args {:?}", binary, args);

        let start = Instant::now();
        let output = Command::new(&binary)
            .args(args)
            .output()
            .map_err(|e| spawn_error(&binary, e))?;

        let result = ToolInvocationResult::new(
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            output.status.code(),
        );

        let elapsed_ms = start.elapsed().as_millis();
        if result.succeeded {
            info!("{:?} {:?} succeeded in {}ms", binary, args, elapsed_ms);
        } else {
            warn!(
                "{:?} {:?} failed with {:?} after {}ms: {}",
                binary,
                args,
                result.exit_code,
                elapsed_ms,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}

impl Default for SgfsCli {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_PATH)
    }
}

impl ToolInvoker for SgfsCli {
    fn invoke(&self, args: &[String]) -> std::result::Result<ToolInvocationResult, LifecycleError> {
        self.run(args).map_err(LifecycleError::from)
    }
}

fn spawn_error(binary: &Path, error: std::io::Error) -> SysError {
    let path = binary.display().to_string();
    match error.kind() {
        ErrorKind::NotFound => SysError::ToolNotFound(path),
        ErrorKind::PermissionDenied => SysError::PermissionDenied(path),
        _ => SysError::Spawn {
            path,
            reason: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_with_separators_are_used_verbatim() {
        let cli = SgfsCli::default();
        assert_eq!(
            cli.resolve_binary().expect("relative path"),
            PathBuf::from("./sgfs_cli")
        );

        let cli = SgfsCli::new("/opt/sgfs/bin/sgfs_cli");
        assert_eq!(
            cli.resolve_binary().expect("absolute path"),
            PathBuf::from("/opt/sgfs/bin/sgfs_cli")
        );
    }

    #[test]
    fn unknown_bare_name_is_tool_not_found() {
        let cli = SgfsCli::new("sgfs-cli-that-does-not-exist-anywhere");
        assert!(matches!(
            cli.resolve_binary(),
            Err(SysError::ToolNotFound(_))
        ));
    }

    #[test]
    fn spawn_errors_map_by_io_kind() {
        let binary = Path::new("./sgfs_cli");
        assert!(matches!(
            spawn_error(binary, std::io::Error::from(ErrorKind::NotFound)),
            SysError::ToolNotFound(_)
        ));
        assert!(matches!(
            spawn_error(binary, std::io::Error::from(ErrorKind::PermissionDenied)),
            SysError::PermissionDenied(_)
        ));
        assert!(matches!(
            spawn_error(binary, std::io::Error::other("exec format error")),
            SysError::Spawn { .. }
        ));
    }
}
