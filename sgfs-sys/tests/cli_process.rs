// SPDX-License-Identifier: GPL-3.0-only

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;

use sgfs_contracts::{LifecycleErrorKind, ToolInvoker};
use sgfs_sys::{SgfsCli, SysError};

fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}

#[test]
fn successful_run_captures_stdout() {
    let cli = SgfsCli::new("/bin/sh");

    let result = cli
        .run(&sh("echo 'Mounting SGFS at /mnt/sgfs using FUSE...'"))
        .expect("tool runs");

    assert!(result.succeeded);
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(
        result.display_text(),
        "Mounting SGFS at /mnt/sgfs using FUSE..."
    );
}

#[test]
fn non_zero_exit_is_a_result_not_an_error() {
    let cli = SgfsCli::new("/bin/sh");

    let result = cli
        .invoke(&sh(
            "echo 'Unmounting SGFS from /mnt/sgfs...'; echo 'Failed to unmount SGFS' >&2; exit 1",
        ))
        .expect("tool runs");

    assert!(!result.succeeded);
    assert_eq!(result.exit_code, Some(1));
    assert_eq!(
        result.combined_output_text,
        "Unmounting SGFS from /mnt/sgfs...\nFailed to unmount SGFS\n"
    );
}

#[test]
fn arguments_are_passed_without_shell_splitting() {
    let cli = SgfsCli::new("/bin/sh");
    let args = vec![
        "-c".to_string(),
        "printf '%s|' \"$@\"".to_string(),
        "sgfs_cli".to_string(),
        "f".to_string(),
        "/dev/disk with spaces".to_string(),
        "4096".to_string(),
    ];

    let result = cli.run(&args).expect("tool runs");

    assert_eq!(result.stdout, "f|/dev/disk with spaces|4096|");
}

#[test]
fn missing_executable_is_a_launch_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = SgfsCli::new(dir.path().join("sgfs_cli"));

    let error = cli.run(&["m".to_string()]).expect_err("missing tool");
    assert!(matches!(error, SysError::ToolNotFound(_)));

    let error = cli.invoke(&["m".to_string()]).expect_err("missing tool");
    assert_eq!(error.kind, LifecycleErrorKind::ToolLaunch);
}

#[test]
fn non_executable_file_is_a_launch_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool: PathBuf = dir.path().join("sgfs_cli");
    fs::write(&tool, "#!/bin/sh\necho never\n").expect("write tool");

    let error = SgfsCli::new(&tool)
        .invoke(&["mdd".to_string()])
        .expect_err("tool is not executable");

    assert_eq!(error.kind, LifecycleErrorKind::ToolLaunch);
}
