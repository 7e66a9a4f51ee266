// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_PREFIX: &str = "sgfs-manager.log";
const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const OUR_CRATES: &[&str] = &[
    "sgfs_manager",
    "sgfs_lifecycle",
    "sgfs_sys",
    "sgfs_contracts",
];

pub(crate) fn init(config: &Config) {
    // Reports go to stdout; diagnostics stay on stderr.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter(config));

    if !config.log_to_disk {
        tracing_subscriber::registry().with(stderr_layer).init();
        return;
    }

    let target = LogTarget::new(config.log_dir());
    match target.open() {
        Ok((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(env_filter(config));

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();

            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            eprintln!("sgfs-manager: file logging disabled: {e:#}");
            tracing_subscriber::registry().with(stderr_layer).init();
        }
    }
}

/// `RUST_LOG` wins; otherwise our crates log at the configured level and
/// everything else at warn.
fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config))
}

fn default_filter(config: &Config) -> EnvFilter {
    let level = config.log_level.as_directive();
    OUR_CRATES
        .iter()
        .filter_map(|target| format!("{target}={level}").parse().ok())
        .fold(EnvFilter::new("warn"), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Daily-rolling log files in one directory
struct LogTarget {
    dir: PathBuf,
}

impl LogTarget {
    fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn open(&self) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create {}", self.dir.display()))?;

        let pruned = self.prune(SystemTime::now(), RETENTION);
        if pruned > 0 {
            eprintln!("sgfs-manager: removed {pruned} old log file(s)");
        }

        let appender = tracing_appender::rolling::daily(&self.dir, LOG_PREFIX);
        Ok(tracing_appender::non_blocking(appender))
    }

    /// Remove our own log files last written before `now - keep`
    fn prune(&self, now: SystemTime, keep: Duration) -> usize {
        let Some(cutoff) = now.checked_sub(keep) else {
            return 0;
        };
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };

        entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_PREFIX))
            .filter(|entry| {
                entry
                    .metadata()
                    .ok()
                    .filter(|metadata| metadata.is_file())
                    .and_then(|metadata| metadata.modified().ok())
                    .is_some_and(|modified| modified < cutoff)
            })
            .filter(|entry| fs::remove_file(entry.path()).is_ok())
            .count()
    }
}
