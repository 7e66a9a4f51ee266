// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sgfs_types::{BackupOptions, LifecycleRequest};

use crate::config::LoggingLevel;

/// Mount, browse and format SGFS volumes through the sgfs_cli tool
#[derive(Parser, Debug)]
#[command(name = "sgfs-manager", version)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/sgfs-manager/config.toml)
    #[arg(long, global = true, env = "SGFS_MANAGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path or name of the SGFS tool
    #[arg(long, global = true)]
    pub tool: Option<PathBuf>,

    /// Directory the tool mounts volumes at
    #[arg(long, global = true)]
    pub mount_point: Option<PathBuf>,

    /// Browse root while nothing is mounted
    #[arg(long, global = true)]
    pub fallback_root: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LoggingLevel>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Skip confirmation prompts for format, revert and delete
    #[arg(short = 'y', long = "yes", global = true)]
    pub assume_yes: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session (the default)
    Session,
    /// Print the effective configuration as TOML
    Config,
    #[command(flatten)]
    Action(Action),
}

/// Operations available both as one-shot commands and inside a session
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Mount an SGFS disk
    Mount { disk: PathBuf },
    /// Unmount the SGFS volume
    Unmount,
    /// Format a disk with SGFS
    Format { disk: PathBuf },
    /// Back up a disk's metadata into a directory
    Backup {
        disk: PathBuf,
        backup_dir: PathBuf,
        #[arg(long, default_value = "ext4")]
        filesystem: String,
        #[arg(long, default_value = "gpt")]
        partition_table: String,
    },
    /// Restore a disk from a backup file
    Revert { disk: PathBuf, backup_file: PathBuf },
    /// Print the current browse root
    Root,
    /// List entries under the browse root
    Ls { path: Option<PathBuf> },
    /// Delete entries under the browse root
    #[command(alias = "rm")]
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show mount state, browse root and running operation
    Status,
}

impl Action {
    /// The lifecycle request behind this action, or the action back when it
    /// is handled locally
    pub fn into_request(self) -> Result<LifecycleRequest, Action> {
        match self {
            Action::Mount { disk } => Ok(LifecycleRequest::Mount { disk }),
            Action::Unmount => Ok(LifecycleRequest::Unmount),
            Action::Format { disk } => Ok(LifecycleRequest::Format { disk }),
            Action::Backup {
                disk,
                backup_dir,
                filesystem,
                partition_table,
            } => Ok(LifecycleRequest::Backup {
                disk,
                options: BackupOptions {
                    backup_dir,
                    filesystem,
                    partition_table,
                },
            }),
            Action::Revert { disk, backup_file } => {
                Ok(LifecycleRequest::Revert { disk, backup_file })
            }
            other => Err(other),
        }
    }
}

/// One line typed into an interactive session
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    #[command(flatten)]
    Action(Action),
    /// Leave the session once running operations finish
    #[command(alias = "exit")]
    Quit,
}

/// Split a session line into words, honouring single and double quotes
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
        SessionLine::command().debug_assert();
    }

    #[test]
    fn one_shot_actions_parse() {
        let cli = Cli::try_parse_from(["sgfs-manager", "--json", "mount", "/dev/sdx"])
            .expect("parse mount");
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Some(Command::Action(Action::Mount { .. }))
        ));

        let cli = Cli::try_parse_from(["sgfs-manager"]).expect("parse bare");
        assert!(cli.command.is_none());
    }

    #[test]
    fn session_lines_parse_actions_and_quit() {
        let line = SessionLine::try_parse_from(["format", "/dev/sdy"]).expect("parse format");
        assert!(matches!(
            line.command,
            SessionCommand::Action(Action::Format { .. })
        ));

        let line = SessionLine::try_parse_from(["exit"]).expect("parse exit");
        assert!(matches!(line.command, SessionCommand::Quit));

        assert!(SessionLine::try_parse_from(["delete"]).is_err());
    }

    #[test]
    fn backup_defaults_labels() {
        let line = SessionLine::try_parse_from(["backup", "/dev/sdb", "/srv/backups"])
            .expect("parse backup");
        let SessionCommand::Action(action) = line.command else {
            panic!("expected an action");
        };

        assert_eq!(
            action.into_request(),
            Ok(LifecycleRequest::Backup {
                disk: PathBuf::from("/dev/sdb"),
                options: BackupOptions {
                    backup_dir: PathBuf::from("/srv/backups"),
                    filesystem: "ext4".into(),
                    partition_table: "gpt".into(),
                },
            })
        );
    }

    #[test]
    fn local_actions_are_handed_back() {
        assert_eq!(Action::Root.into_request(), Err(Action::Root));
    }

    #[test]
    fn words_respect_quotes() {
        assert_eq!(
            split_words(r#"rm "My Files/a b.txt" 'c d' e"#).unwrap(),
            vec!["rm", "My Files/a b.txt", "c d", "e"]
        );
        assert_eq!(split_words("  mount   /dev/sdx  ").unwrap(), vec!["mount", "/dev/sdx"]);
        assert_eq!(split_words(r#"rm """#).unwrap(), vec!["rm", ""]);
        assert!(split_words("").unwrap().is_empty());
        assert!(split_words(r#"rm "oops"#).is_err());
    }
}
