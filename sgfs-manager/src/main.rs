// SPDX-License-Identifier: GPL-3.0-only

mod cli;
mod config;
mod logging;
mod session;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sgfs_lifecycle::LifecycleHandle;
use tokio::io::BufReader;
use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .context("cannot load configuration")?
        .with_overrides(&cli)
        .context("invalid command-line overrides")?;

    if let Some(Command::Config) = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(ExitCode::SUCCESS);
    }

    logging::init(&config);
    info!(
        tool = %config.lifecycle.tool_path.display(),
        mount_point = %config.lifecycle.mount_point.display(),
        "sgfs-manager starting"
    );

    let handle = LifecycleHandle::from_config(&config.lifecycle)?;
    let input = BufReader::new(tokio::io::stdin());
    let mut session = Session::new(handle, input, std::io::stdout())
        .json(cli.json)
        .assume_yes(cli.assume_yes);

    match cli.command {
        Some(Command::Action(action)) => {
            let succeeded = session.run_once(action).await?;
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None | Some(Command::Session) | Some(Command::Config) => {
            session.run().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
