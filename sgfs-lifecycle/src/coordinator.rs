// SPDX-License-Identifier: GPL-3.0-only

//! Mount lifecycle state machine
//!
//! Two states, `Unmounted` (initial) and `Mounted`, with no terminal state.
//! Only a tool-reported success of mount or unmount moves between them;
//! format, backup and revert never do.
//!
//! One lifecycle operation runs at a time. A call made while another is in
//! flight is rejected with [`LifecycleErrorKind::Busy`] before the tool is
//! touched; nothing is queued.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sgfs_contracts::{LifecycleError, OperationId, ToolInvoker};
use sgfs_sys::SgfsCli;
use sgfs_types::{
    BackupOptions, LifecycleKind, LifecycleRequest, MountState, OperationOutcome, StatusReport,
    ToolInvocationResult,
};
use tracing::{debug, info, info_span, warn};

use crate::args::{FormatGeometry, ToolArguments};
use crate::config::{LifecycleConfig, UnmountPolicy};

/// Conditions the coordinator lets through but the caller should know about
///
/// None of these block a request. A front-end that wants a stricter policy
/// can refuse to submit requests that report any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Mounting while a volume is already mounted
    MountWhileMounted { device: PathBuf },
    /// Formatting the disk that backs the mounted volume
    FormatWhileMounted { device: PathBuf },
    /// Reverting the disk that backs the mounted volume
    RevertWhileMounted { device: PathBuf },
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MountWhileMounted { device } => write!(
                f,
                "{} is already mounted; mounting again is passed to the tool as is",
                device.display()
            ),
            Self::FormatWhileMounted { device } => write!(
                f,
                "{} backs the mounted volume; formatting it will destroy the mounted data",
                device.display()
            ),
            Self::RevertWhileMounted { device } => write!(
                f,
                "{} backs the mounted volume; reverting it while mounted is unsafe",
                device.display()
            ),
        }
    }
}

/// Owner of the mount state and gate for lifecycle operations
pub struct Coordinator<I = SgfsCli> {
    invoker: I,
    arguments: ToolArguments,
    geometry: FormatGeometry,
    mount_point: PathBuf,
    unmount_policy: UnmountPolicy,
    state: Mutex<MountState>,
    in_flight: Mutex<Option<LifecycleKind>>,
}

impl Coordinator<SgfsCli> {
    /// Coordinator driving the real tool at `config.tool_path`
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self::with_invoker(SgfsCli::new(&config.tool_path), config)
    }
}

impl<I: ToolInvoker> Coordinator<I> {
    pub fn with_invoker(invoker: I, config: &LifecycleConfig) -> Self {
        Self {
            invoker,
            arguments: config.arguments.clone(),
            geometry: config.format,
            mount_point: config.mount_point.clone(),
            unmount_policy: config.unmount_policy,
            state: Mutex::new(MountState::Unmounted),
            in_flight: Mutex::new(None),
        }
    }

    /// Copy of the current mount state
    pub fn state(&self) -> MountState {
        self.lock_state().clone()
    }

    /// Lifecycle operation currently running, if any
    pub fn in_flight(&self) -> Option<LifecycleKind> {
        *self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn mount(&self, disk: impl Into<PathBuf>) -> Result<StatusReport, LifecycleError> {
        self.execute(LifecycleRequest::Mount { disk: disk.into() })
    }

    pub fn unmount(&self) -> Result<StatusReport, LifecycleError> {
        self.execute(LifecycleRequest::Unmount)
    }

    /// Format `disk`. This commits immediately; confirmation is the caller's job.
    pub fn format(&self, disk: impl Into<PathBuf>) -> Result<StatusReport, LifecycleError> {
        self.execute(LifecycleRequest::Format { disk: disk.into() })
    }

    pub fn backup(
        &self,
        disk: impl Into<PathBuf>,
        options: BackupOptions,
    ) -> Result<StatusReport, LifecycleError> {
        self.execute(LifecycleRequest::Backup {
            disk: disk.into(),
            options,
        })
    }

    pub fn revert(
        &self,
        disk: impl Into<PathBuf>,
        backup_file: impl Into<PathBuf>,
    ) -> Result<StatusReport, LifecycleError> {
        self.execute(LifecycleRequest::Revert {
            disk: disk.into(),
            backup_file: backup_file.into(),
        })
    }

    /// Warnings for `request` against the current state
    pub fn preconditions(&self, request: &LifecycleRequest) -> Vec<Precondition> {
        preconditions_for(&self.state(), request)
    }

    /// Ask the tool which disk it has recorded as mounted
    ///
    /// The answer is the tool's own bookkeeping, shown to the operator and
    /// never folded into the mount state. The query still takes the
    /// in-flight slot, so it is refused as busy while an operation runs.
    pub fn query_mounted(&self) -> Result<StatusReport, LifecycleError> {
        let _slot = self.claim(LifecycleKind::Query)?;
        let args = self.arguments.query.clone();
        debug!("Querying tool with {:?}", args);

        let report = match self.invoker.invoke(&args) {
            Ok(result) => {
                let outcome = if result.succeeded {
                    OperationOutcome::Succeeded
                } else {
                    OperationOutcome::ToolFailed
                };
                StatusReport::new(outcome, result.display_text(), self.state())
            }
            Err(error) => {
                warn!("Could not launch tool for query: {}", error.message);
                StatusReport::new(OperationOutcome::LaunchFailed, error.message, self.state())
            }
        };
        Ok(report)
    }

    /// Run one lifecycle operation to completion
    ///
    /// The only `Err` is [`LifecycleErrorKind::Busy`]. Launch failures and
    /// tool-reported failures come back as a [`StatusReport`] whose outcome
    /// says which, with the state left as the operation's rules dictate.
    pub fn execute(&self, request: LifecycleRequest) -> Result<StatusReport, LifecycleError> {
        let kind = request.kind();
        let _slot = self.claim(kind)?;

        let id = OperationId::new();
        let span = info_span!("lifecycle", op = %kind, id = %id);
        let _enter = span.enter();

        for precondition in self.preconditions(&request) {
            warn!("{}", precondition);
        }

        let args = self.arguments.render(&request, &self.geometry);
        debug!("Invoking tool with {:?}", args);

        let report = match self.invoker.invoke(&args) {
            Ok(result) => self.apply(&request, result),
            Err(error) => {
                warn!("Could not launch tool for {}: {}", kind, error.message);
                StatusReport::new(OperationOutcome::LaunchFailed, error.message, self.state())
            }
        };

        info!(
            "{} finished: {:?}, state now {}",
            kind, report.outcome, report.current_state
        );
        Ok(report)
    }

    fn apply(&self, request: &LifecycleRequest, result: ToolInvocationResult) -> StatusReport {
        let mut state = self.lock_state();

        match request {
            LifecycleRequest::Mount { disk } if result.succeeded => {
                *state = MountState::Mounted {
                    mount_point: self.mount_point.clone(),
                    device: disk.clone(),
                };
            }
            LifecycleRequest::Unmount
                if result.succeeded || self.unmount_policy == UnmountPolicy::Always =>
            {
                if !result.succeeded {
                    warn!("Tool reported unmount failure; forcing unmounted state by policy");
                }
                *state = MountState::Unmounted;
            }
            _ => {}
        }

        let outcome = if result.succeeded {
            OperationOutcome::Succeeded
        } else {
            OperationOutcome::ToolFailed
        };

        StatusReport::new(outcome, result.display_text(), state.clone())
    }

    fn claim(&self, kind: LifecycleKind) -> Result<InFlight<'_>, LifecycleError> {
        let mut slot = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(running) = *slot {
            warn!("Rejecting {}: {} is still running", kind, running);
            return Err(LifecycleError::busy(format!(
                "cannot {kind} while {running} is still running"
            )));
        }

        *slot = Some(kind);
        Ok(InFlight {
            slot: &self.in_flight,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, MountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frees the in-flight slot when the operation ends, panics included
struct InFlight<'a> {
    slot: &'a Mutex<Option<LifecycleKind>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn preconditions_for(state: &MountState, request: &LifecycleRequest) -> Vec<Precondition> {
    let Some(mounted) = state.device() else {
        return Vec::new();
    };
    let mounted = mounted.to_path_buf();
    let targets_mounted = request.target_disk() == Some(mounted.as_path());

    match request {
        LifecycleRequest::Mount { .. } => vec![Precondition::MountWhileMounted { device: mounted }],
        LifecycleRequest::Format { .. } if targets_mounted => {
            vec![Precondition::FormatWhileMounted { device: mounted }]
        }
        LifecycleRequest::Revert { .. } if targets_mounted => {
            vec![Precondition::RevertWhileMounted { device: mounted }]
        }
        _ => Vec::new(),
    }
}
