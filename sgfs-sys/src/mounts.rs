// SPDX-License-Identifier: GPL-3.0-only

//! Read-only view of the kernel mount table
//!
//! The coordinator trusts the tool's own report and never consults this.
//! Front-ends use it to show the operator what the kernel currently thinks.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

const PROC_MOUNTS: &str = "/proc/mounts";

/// Unescape octal sequences in /proc/mounts paths (e.g. `\040` -> ` `)
fn unescape_mount_path(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let octal: String = chars.as_str().chars().take(3).collect();
        let decoded = (octal.len() == 3 && octal.bytes().all(|b| (b'0'..=b'7').contains(&b)))
            .then(|| u8::from_str_radix(&octal, 8).ok())
            .flatten();

        match decoded {
            Some(byte) => {
                result.push(byte as char);
                chars.nth(2);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Mount points listed in a mounts table, in file order
pub fn parse_mount_points(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|mount_point| PathBuf::from(unescape_mount_path(mount_point)))
        .collect()
}

/// Whether `mount_point` appears in the kernel mount table
pub fn is_mounted(mount_point: &Path) -> Result<bool> {
    debug!("Checking if {:?} is mounted", mount_point);

    let canonical = mount_point
        .canonicalize()
        .unwrap_or_else(|_| mount_point.to_path_buf());

    let mounts = std::fs::read_to_string(PROC_MOUNTS)?;
    Ok(parse_mount_points(&mounts).contains(&canonical))
}
