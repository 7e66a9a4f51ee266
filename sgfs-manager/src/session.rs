// SPDX-License-Identifier: GPL-3.0-only

//! Interactive and one-shot front-end over a [`LifecycleHandle`]
//!
//! Inside a session, lifecycle calls run as background tasks so commands
//! keep being read while the tool works. Reports are printed as the calls
//! finish. A call submitted while another is running comes back as a busy
//! report; nothing is queued.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use sgfs_contracts::{LifecycleError, ToolInvoker};
use sgfs_lifecycle::{LifecycleHandle, Precondition};
use sgfs_types::{DeleteResult, LifecycleKind, LifecycleRequest, OperationOutcome, StatusReport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::cli::{Action, SessionCommand, SessionLine, split_words};

type Completion = (
    LifecycleKind,
    Vec<Precondition>,
    Result<StatusReport, LifecycleError>,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Session<I, R, W> {
    handle: LifecycleHandle<I>,
    input: Lines<R>,
    output: W,
    json: bool,
    assume_yes: bool,
}

impl<I, R, W> Session<I, R, W>
where
    I: ToolInvoker + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(handle: LifecycleHandle<I>, input: R, output: W) -> Self {
        Self {
            handle,
            input: input.lines(),
            output,
            json: false,
            assume_yes: false,
        }
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Read commands until `quit` or end of input, then wait for running
    /// operations and print their reports
    pub async fn run(&mut self) -> io::Result<()> {
        let mut running: JoinSet<Completion> = JoinSet::new();

        if !self.json {
            self.print_root()?;
        }
        self.prompt()?;

        loop {
            tokio::select! {
                line = self.input.next_line() => {
                    let Some(line) = line? else { break };
                    if self.handle_line(&line, &mut running).await? == Flow::Quit {
                        break;
                    }
                    self.prompt()?;
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    self.finish(joined)?;
                    self.prompt()?;
                }
            }
        }

        if !running.is_empty() {
            debug!("Waiting for {} running operation(s)", running.len());
        }
        while let Some(joined) = running.join_next().await {
            self.finish(joined)?;
        }
        Ok(())
    }

    /// Run a single action to completion and report whether it succeeded
    pub async fn run_once(&mut self, action: Action) -> io::Result<bool> {
        match action.into_request() {
            Ok(request) => {
                let kind = request.kind();
                let Some(warnings) = self.approve(&request).await? else {
                    return Ok(false);
                };
                let result = self.handle.execute(request).await;
                let report = self.report_for(result);
                self.print_report(kind, &warnings, &report)?;
                Ok(report.outcome.is_success())
            }
            Err(local) => self.local(local).await,
        }
    }

    async fn handle_line(
        &mut self,
        line: &str,
        running: &mut JoinSet<Completion>,
    ) -> io::Result<Flow> {
        let words = match split_words(line) {
            Ok(words) => words,
            Err(e) => {
                self.error(&e)?;
                return Ok(Flow::Continue);
            }
        };
        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        let parsed = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) if self.json => {
                self.error(e.render().to_string().trim_end())?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                write!(self.output, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
        };

        match parsed.command {
            SessionCommand::Quit => Ok(Flow::Quit),
            SessionCommand::Action(action) => {
                match action.into_request() {
                    Ok(request) => {
                        if let Some(warnings) = self.approve(&request).await? {
                            let kind = request.kind();
                            let handle = self.handle.clone();
                            debug!("Starting {} in the background", kind);
                            running.spawn(async move {
                                (kind, warnings, handle.execute(request).await)
                            });
                        }
                    }
                    Err(local) => {
                        self.local(local).await?;
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }

    /// Surface preconditions and ask before destructive calls
    ///
    /// Returns the preconditions when the call may go ahead. In JSON mode
    /// they travel with the report instead of being printed here.
    async fn approve(
        &mut self,
        request: &LifecycleRequest,
    ) -> io::Result<Option<Vec<Precondition>>> {
        let warnings = self.handle.preconditions(request);
        if !self.json {
            for precondition in &warnings {
                writeln!(self.output, "warning: {precondition}")?;
            }
        }

        let question = match request {
            LifecycleRequest::Format { disk } => format!(
                "Are you sure you want to format {} with SGFS?",
                disk.display()
            ),
            LifecycleRequest::Revert { disk, backup_file } => format!(
                "Are you sure you want to overwrite {} from {}?",
                disk.display(),
                backup_file.display()
            ),
            _ => return Ok(Some(warnings)),
        };
        Ok(self.confirm(&question).await?.then_some(warnings))
    }

    async fn confirm(&mut self, question: &str) -> io::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        // Keep stdout to one JSON object per line
        if self.json {
            let mut stderr = io::stderr();
            write!(stderr, "{question} [y/N] ")?;
            stderr.flush()?;
        } else {
            write!(self.output, "{question} [y/N] ")?;
            self.output.flush()?;
        }

        let answer = self.input.next_line().await?.unwrap_or_default();
        let approved = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
        if !approved {
            if self.json {
                self.emit_json(&json!({ "cancelled": question }))?;
            } else {
                writeln!(self.output, "cancelled")?;
            }
        }
        Ok(approved)
    }

    async fn local(&mut self, action: Action) -> io::Result<bool> {
        match action {
            Action::Root => {
                self.print_root()?;
                Ok(true)
            }
            Action::Status => {
                self.print_status().await?;
                Ok(true)
            }
            Action::Ls { path } => self.list(path).await,
            Action::Delete { paths } => self.delete(paths).await,
            other => {
                self.error(&format!("{other:?} is a lifecycle operation"))?;
                Ok(false)
            }
        }
    }

    async fn list(&mut self, path: Option<PathBuf>) -> io::Result<bool> {
        let root = self.handle.browse_root();
        let dir = match path {
            Some(path) => root.join(path),
            None => root,
        };

        let entries = match read_entries(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                self.error(&format!("cannot list {}: {e}", dir.display()))?;
                return Ok(false);
            }
        };

        if self.json {
            self.emit_json(&json!({ "directory": dir, "entries": entries }))?;
        } else {
            for entry in entries {
                writeln!(self.output, "{entry}")?;
            }
        }
        Ok(true)
    }

    async fn delete(&mut self, paths: Vec<PathBuf>) -> io::Result<bool> {
        let root = self.handle.browse_root();
        let question = match paths.as_slice() {
            [single] => format!("Delete {} under {}?", single.display(), root.display()),
            many => format!("Delete {} entries under {}?", many.len(), root.display()),
        };
        if !self.confirm(&question).await? {
            return Ok(false);
        }

        let result = match self.handle.delete(paths).await {
            Ok(result) => result,
            Err(e) => {
                self.error(&e.message)?;
                return Ok(false);
            }
        };
        self.print_delete(&result)?;
        Ok(result.is_complete())
    }

    fn finish(&mut self, joined: Result<Completion, JoinError>) -> io::Result<()> {
        match joined {
            Ok((kind, warnings, result)) => {
                let report = self.report_for(result);
                info!(operation = %kind, outcome = ?report.outcome, "Operation finished");
                self.print_report(kind, &warnings, &report)
            }
            Err(e) => {
                warn!("Lifecycle task failed: {}", e);
                self.error(&format!("operation task failed: {e}"))
            }
        }
    }

    /// Busy rejections and worker failures still produce a report
    fn report_for(&self, result: Result<StatusReport, LifecycleError>) -> StatusReport {
        match result {
            Ok(report) => report,
            Err(error) => {
                // Only a busy rejection is worth retrying later
                let outcome = if error.kind.is_retryable() {
                    OperationOutcome::Busy
                } else {
                    OperationOutcome::LaunchFailed
                };
                StatusReport::new(outcome, error.message, self.handle.state())
            }
        }
    }

    fn print_report(
        &mut self,
        kind: LifecycleKind,
        warnings: &[Precondition],
        report: &StatusReport,
    ) -> io::Result<()> {
        if self.json {
            let warnings: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            return self.emit_json(&json!({
                "operation": kind.as_str(),
                "warnings": warnings,
                "report": report,
            }));
        }

        writeln!(self.output, "{kind}: {}", report.display_text)?;
        if kind.touches_mount_state() {
            let root = self.handle.browse_root();
            writeln!(self.output, "browse root: {}", root.display())?;
        }
        Ok(())
    }

    fn print_root(&mut self) -> io::Result<()> {
        let root = self.handle.browse_root();
        if self.json {
            return self.emit_json(&json!({ "browse_root": root }));
        }
        writeln!(self.output, "browse root: {}", root.display())
    }

    /// Coordinator state next to what the tool and the kernel each report
    ///
    /// The tool keeps its own record of the mounted disk, which the kernel
    /// mount table may not reflect. Both are informational only.
    async fn print_status(&mut self) -> io::Result<()> {
        let tool_reports = match self.handle.query_mounted().await {
            Ok(report) => report.display_text,
            Err(e) if e.kind.is_retryable() => format!("not asked ({})", e.message),
            Err(e) => format!("unknown ({})", e.message),
        };

        let state = self.handle.state();
        let root = self.handle.browse_root();
        let coordinator = self.handle.coordinator();
        let running = coordinator.in_flight();
        let mount_table = match sgfs_sys::is_mounted(coordinator.mount_point()) {
            Ok(true) => "mounted",
            Ok(false) => "not mounted",
            Err(e) => {
                debug!("Mount table check failed: {}", e);
                "unknown"
            }
        };

        if self.json {
            return self.emit_json(&json!({
                "state": state,
                "browse_root": root,
                "running": running.map(LifecycleKind::as_str),
                "tool_reports": tool_reports,
                "mount_table": mount_table,
            }));
        }

        writeln!(self.output, "state: {state}")?;
        writeln!(self.output, "browse root: {}", root.display())?;
        match running {
            Some(kind) => writeln!(self.output, "running: {kind}")?,
            None => writeln!(self.output, "running: none")?,
        }
        writeln!(self.output, "tool reports: {tool_reports}")?;
        writeln!(self.output, "mount table: {mount_table}")
    }

    fn print_delete(&mut self, result: &DeleteResult) -> io::Result<()> {
        if self.json {
            return self.emit_json(result);
        }
        for path in &result.deleted {
            writeln!(self.output, "deleted {}", path.display())?;
        }
        for failure in &result.failed {
            writeln!(
                self.output,
                "failed {}: {}",
                failure.path.display(),
                failure.reason
            )?;
        }
        Ok(())
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        if self.json {
            return self.emit_json(&json!({ "error": message }));
        }
        writeln!(self.output, "error: {message}")
    }

    fn emit_json(&mut self, value: &impl Serialize) -> io::Result<()> {
        let line = serde_json::to_string(value)?;
        writeln!(self.output, "{line}")
    }

    fn prompt(&mut self) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        write!(self.output, "sgfs> ")?;
        self.output.flush()
    }
}

/// Directory entries sorted by name, directories suffixed with `/`
async fn read_entries(dir: &Path) -> io::Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}
