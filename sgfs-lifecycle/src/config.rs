// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Component, PathBuf};

use serde::{Deserialize, Serialize};
use sgfs_contracts::{LifecycleError, LifecycleErrorKind};
use sgfs_sys::DEFAULT_TOOL_PATH;
use thiserror::Error;

use crate::args::{FormatGeometry, ToolArguments};

/// Where the tool mounts SGFS volumes
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/sgfs";
/// Browse root while nothing is mounted
pub const DEFAULT_FALLBACK_ROOT: &str = "/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for LifecycleError {
    fn from(error: ConfigError) -> Self {
        LifecycleError::new(LifecycleErrorKind::InvalidConfig, error.to_string())
    }
}

/// What to believe after the tool reports a failed unmount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmountPolicy {
    /// Keep the current state; only a reported success unmounts
    #[default]
    OnSuccess,
    /// Drop to `Unmounted` whenever the tool ran, whatever it reported
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Bare name (looked up in `PATH`) or path to the SGFS tool
    pub tool_path: PathBuf,
    pub mount_point: PathBuf,
    pub fallback_root: PathBuf,
    pub unmount_policy: UnmountPolicy,
    pub format: FormatGeometry,
    pub arguments: ToolArguments,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tool_path: PathBuf::from(DEFAULT_TOOL_PATH),
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            fallback_root: PathBuf::from(DEFAULT_FALLBACK_ROOT),
            unmount_policy: UnmountPolicy::default(),
            format: FormatGeometry::default(),
            arguments: ToolArguments::default(),
        }
    }
}

impl LifecycleConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tool_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("tool_path must not be empty".into()));
        }

        for (name, path) in [
            ("mount_point", &self.mount_point),
            ("fallback_root", &self.fallback_root),
        ] {
            if !path.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be an absolute path, got {path:?}"
                )));
            }
            if path.components().any(|c| c == Component::ParentDir) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not contain `..`, got {path:?}"
                )));
            }
        }

        let empty = self.arguments.empty_templates();
        if !empty.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "argument templates must not be empty: {}",
                empty.join(", ")
            )));
        }

        if self.format.block_size == 0 || self.format.total_blocks == 0 {
            return Err(ConfigError::Invalid(
                "format block_size and total_blocks must be non-zero".into(),
            ));
        }

        Ok(())
    }
}
