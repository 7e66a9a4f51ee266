// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sgfs_lifecycle::{ConfigError, LifecycleConfig};

use crate::cli::Cli;

const APP_DIR: &str = "sgfs-manager";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_to_disk: bool,
    pub log_level: LoggingLevel,
    /// Directory for rolling log files; see [`default_log_dir`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Lifecycle keys sit at the top level of the file
    #[serde(flatten)]
    pub lifecycle: LifecycleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_to_disk: true,
            log_level: LoggingLevel::Info,
            log_dir: None,
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.lifecycle.validate()?;
        Ok(config)
    }

    /// Load from `explicit`, or from the default location when present
    ///
    /// An explicit file must exist and parse. A missing default file means
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path, source })?;
        Self::from_toml_str(&raw)
    }

    /// Where rolling log files go
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }

    /// Apply command-line overrides and re-validate
    pub fn with_overrides(mut self, cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(tool) = &cli.tool {
            self.lifecycle.tool_path = tool.clone();
        }
        if let Some(mount_point) = &cli.mount_point {
            self.lifecycle.mount_point = mount_point.clone();
        }
        if let Some(fallback_root) = &cli.fallback_root {
            self.lifecycle.fallback_root = fallback_root.clone();
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }

        self.lifecycle.validate()?;
        Ok(self)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join(APP_DIR).join(CONFIG_FILE));
    }

    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE)
    })
}

/// `SGFS_MANAGER_LOG_DIR`, else the XDG state directory
pub fn default_log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SGFS_MANAGER_LOG_DIR") {
        return PathBuf::from(dir);
    }

    let state = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state")))
        .unwrap_or_else(std::env::temp_dir);
    state.join(APP_DIR).join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use sgfs_lifecycle::UnmountPolicy;

    #[test]
    fn lifecycle_keys_live_at_top_level() {
        let config = Config::from_toml_str(
            r#"
            tool_path = "sgfs_cli"
            unmount_policy = "always"
            log_level = "debug"
            log_to_disk = false
            log_dir = "/var/log/sgfs"

            [arguments]
            unmount = ["mdd", "none"]
            "#,
        )
        .expect("parse config");

        assert_eq!(config.lifecycle.tool_path, PathBuf::from("sgfs_cli"));
        assert_eq!(config.lifecycle.unmount_policy, UnmountPolicy::Always);
        assert_eq!(config.lifecycle.arguments.unmount, vec!["mdd", "none"]);
        assert_eq!(config.lifecycle.mount_point, PathBuf::from("/mnt/sgfs"));
        assert_eq!(config.log_level, LoggingLevel::Debug);
        assert!(!config.log_to_disk);
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/sgfs"));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.toml");
        let error = Config::load(Some(missing.as_path())).expect_err("missing");
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().contains("failed to read config"));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mount_point = \"/media/sgfs\"\n").expect("write config");

        let config = Config::load(Some(path.as_path())).expect("load config");

        assert_eq!(config.lifecycle.mount_point, PathBuf::from("/media/sgfs"));
        assert!(config.log_to_disk);
    }

    #[test]
    fn cli_overrides_win_and_are_validated() {
        let cli = Cli::try_parse_from([
            "sgfs-manager",
            "--tool",
            "/opt/sgfs/sgfs_cli",
            "--fallback-root",
            "/srv",
            "--log-level",
            "warn",
            "status",
        ])
        .expect("parse cli");

        let config = Config::default().with_overrides(&cli).expect("valid overrides");
        assert_eq!(
            config.lifecycle.tool_path,
            PathBuf::from("/opt/sgfs/sgfs_cli")
        );
        assert_eq!(config.lifecycle.fallback_root, PathBuf::from("/srv"));
        assert_eq!(config.log_level, LoggingLevel::Warn);

        let cli = Cli::try_parse_from(["sgfs-manager", "--mount-point", "relative", "status"])
            .expect("parse cli");
        assert!(Config::default().with_overrides(&cli).is_err());
    }

    #[test]
    fn printed_config_is_loadable() {
        let raw = Config::default().to_toml_string().expect("serialize config");
        assert!(raw.contains("tool_path = \"./sgfs_cli\""));
        assert_eq!(
            Config::from_toml_str(&raw).expect("parse printed config"),
            Config::default()
        );
    }
}
