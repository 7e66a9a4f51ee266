// SPDX-License-Identifier: GPL-3.0-only

//! Argument templates for the external tool
//!
//! Each lifecycle kind maps to a vector of template elements. An element may
//! contain `{placeholder}` markers which are replaced in a single pass, so a
//! substituted value is never expanded again. An element always stays one
//! argument, whatever the substituted value contains.

use serde::{Deserialize, Serialize};
use sgfs_types::LifecycleRequest;

/// Geometry handed to the tool when formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatGeometry {
    pub block_size: u32,
    pub total_blocks: u32,
}

impl Default for FormatGeometry {
    fn default() -> Self {
        Self {
            block_size: 4096,
            total_blocks: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolArguments {
    pub mount: Vec<String>,
    /// `["mdd"]` by default; some tool builds expect `["mdd", "none"]`
    pub unmount: Vec<String>,
    pub format: Vec<String>,
    pub backup: Vec<String>,
    pub revert: Vec<String>,
    /// Asks the tool which disk it has recorded as mounted
    pub query: Vec<String>,
}

impl Default for ToolArguments {
    fn default() -> Self {
        Self {
            mount: strings(&["m", "{disk}"]),
            unmount: strings(&["mdd"]),
            format: strings(&["f", "{disk}", "{block_size}", "{total_blocks}"]),
            backup: strings(&[
                "backup",
                "{disk}",
                "{backup_dir}",
                "FILESYSTEM='{filesystem}'",
                "PARTITION_TABLE='{partition_table}'",
            ]),
            revert: strings(&["revert", "{disk}", "{backup_file}"]),
            query: strings(&["im"]),
        }
    }
}

impl ToolArguments {
    pub fn template_for(&self, request: &LifecycleRequest) -> &[String] {
        match request {
            LifecycleRequest::Mount { .. } => &self.mount,
            LifecycleRequest::Unmount => &self.unmount,
            LifecycleRequest::Format { .. } => &self.format,
            LifecycleRequest::Backup { .. } => &self.backup,
            LifecycleRequest::Revert { .. } => &self.revert,
        }
    }

    /// Expand the template for `request` into the exact argument vector
    pub fn render(&self, request: &LifecycleRequest, geometry: &FormatGeometry) -> Vec<String> {
        let lookup = |name: &str| -> Option<String> {
            match (name, request) {
                ("disk", _) => request
                    .target_disk()
                    .map(|disk| disk.to_string_lossy().into_owned()),
                ("block_size", LifecycleRequest::Format { .. }) => {
                    Some(geometry.block_size.to_string())
                }
                ("total_blocks", LifecycleRequest::Format { .. }) => {
                    Some(geometry.total_blocks.to_string())
                }
                ("backup_dir", LifecycleRequest::Backup { options, .. }) => {
                    Some(options.backup_dir.to_string_lossy().into_owned())
                }
                ("filesystem", LifecycleRequest::Backup { options, .. }) => {
                    Some(options.filesystem.clone())
                }
                ("partition_table", LifecycleRequest::Backup { options, .. }) => {
                    Some(options.partition_table.clone())
                }
                ("backup_file", LifecycleRequest::Revert { backup_file, .. }) => {
                    Some(backup_file.to_string_lossy().into_owned())
                }
                _ => None,
            }
        };

        self.template_for(request)
            .iter()
            .map(|element| expand(element, &lookup))
            .collect()
    }

    /// Names of templates that would produce an empty argument vector
    pub fn empty_templates(&self) -> Vec<&'static str> {
        [
            ("mount", &self.mount),
            ("unmount", &self.unmount),
            ("format", &self.format),
            ("backup", &self.backup),
            ("revert", &self.revert),
            ("query", &self.query),
        ]
        .into_iter()
        .filter(|(_, template)| template.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Single-pass `{name}` substitution; unknown names are kept literally
fn expand(element: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut output = String::with_capacity(element.len());
    let mut rest = element;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = after_open.find('}') else {
            output.push_str(&rest[open..]);
            return output;
        };

        let name = &after_open[..close];
        match lookup(name) {
            Some(value) => output.push_str(&value),
            None => output.push_str(&rest[open..open + close + 2]),
        }
        rest = &after_open[close + 1..];
    }

    output.push_str(rest);
    output
}
