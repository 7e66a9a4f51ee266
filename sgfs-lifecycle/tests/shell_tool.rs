// SPDX-License-Identifier: GPL-3.0-only

//! Drives the coordinator against a real child process.
//!
//! `/bin/sh` stands in for the SGFS tool; the argument templates turn each
//! lifecycle operation into a small script that records its arguments in a
//! scratch directory.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use sgfs_lifecycle::{BrowseRoot, Coordinator, LifecycleConfig, LifecycleHandle};
use sgfs_types::{LifecycleRequest, MountState, OperationOutcome};

fn config(scratch: &Path, mount_point: &Path) -> LifecycleConfig {
    let log = scratch.join("calls.log");
    let raw = format!(
        r#"
        tool_path = "/bin/sh"
        mount_point = "{mount_point}"
        fallback_root = "/"

        [arguments]
        mount = ["-c", "echo \"m $1\" >> {log}; echo \"Mounting SGFS at {mount_point} using FUSE...\"", "sgfs_cli", "{{disk}}"]
        unmount = ["-c", "echo mdd >> {log}; test ! -e {scratch}/busy || {{ echo 'Failed to unmount SGFS' >&2; exit 1; }}; echo 'SGFS unmounted successfully'"]
        format = ["-c", "echo \"f $1 $2 $3\" >> {log}; echo 'Formatted'", "sgfs_cli", "{{disk}}", "{{block_size}}", "{{total_blocks}}"]
        "#,
        mount_point = mount_point.display(),
        log = log.display(),
        scratch = scratch.display(),
    );
    LifecycleConfig::from_toml_str(&raw).expect("test config parses")
}

fn calls(scratch: &Path) -> Vec<String> {
    fs::read_to_string(scratch.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn lifecycle_against_a_real_process() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let mount_point = scratch.path().join("mnt");
    let config = config(scratch.path(), &mount_point);
    let coordinator = Coordinator::from_config(&config);
    let browse = BrowseRoot::from_config(&config);

    let report = coordinator.mount("/dev/sdx").expect("mount accepted");
    assert_eq!(report.outcome, OperationOutcome::Succeeded);
    assert_eq!(
        report.display_text,
        format!("Mounting SGFS at {} using FUSE...", mount_point.display())
    );
    assert_eq!(browse.current_browse_root(&coordinator.state()), mount_point);

    let report = coordinator.format("/dev/sdy").expect("format accepted");
    assert_eq!(report.outcome, OperationOutcome::Succeeded);
    assert!(coordinator.state().is_mounted());

    fs::write(scratch.path().join("busy"), b"").expect("mark busy");
    let report = coordinator.unmount().expect("unmount accepted");
    assert_eq!(report.outcome, OperationOutcome::ToolFailed);
    assert_eq!(report.display_text, "Failed to unmount SGFS");
    assert_eq!(browse.current_browse_root(&coordinator.state()), mount_point);

    fs::remove_file(scratch.path().join("busy")).expect("clear busy");
    let report = coordinator.unmount().expect("unmount accepted");
    assert_eq!(report.outcome, OperationOutcome::Succeeded);
    assert_eq!(report.current_state, MountState::Unmounted);
    assert_eq!(
        browse.current_browse_root(&coordinator.state()),
        PathBuf::from("/")
    );

    assert_eq!(
        calls(scratch.path()),
        vec!["m /dev/sdx", "f /dev/sdy 4096 1024", "mdd", "mdd"]
    );
}

#[test]
fn missing_tool_is_reported_not_fatal() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = LifecycleConfig {
        tool_path: scratch.path().join("sgfs_cli"),
        ..LifecycleConfig::default()
    };
    let coordinator = Coordinator::from_config(&config);

    let report = coordinator.mount("/dev/sdx").expect("mount accepted");

    assert_eq!(report.outcome, OperationOutcome::LaunchFailed);
    assert!(report.display_text.contains("sgfs_cli"));
    assert_eq!(coordinator.state(), MountState::Unmounted);
}

#[tokio::test]
async fn handle_runs_the_tool_off_the_async_executor() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let mount_point = scratch.path().join("mnt");
    let handle = LifecycleHandle::from_config(&config(scratch.path(), &mount_point))
        .expect("valid config");

    let report = handle
        .execute(LifecycleRequest::Mount {
            disk: PathBuf::from("disk.img"),
        })
        .await
        .expect("mount accepted");

    assert!(report.outcome.is_success());
    assert_eq!(handle.browse_root(), mount_point);
}
