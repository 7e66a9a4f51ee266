// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Outcome of one run of the external SGFS tool
///
/// A run that could not start never produces one of these; launch failures
/// travel as errors instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// True when the tool exited with status zero
    pub succeeded: bool,
    /// stdout followed by stderr
    pub combined_output_text: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ToolInvocationResult {
    pub fn new(succeeded: bool, stdout: String, stderr: String, exit_code: Option<i32>) -> Self {
        let mut combined_output_text = String::with_capacity(stdout.len() + stderr.len());
        combined_output_text.push_str(&stdout);
        combined_output_text.push_str(&stderr);

        Self {
            succeeded,
            combined_output_text,
            stdout,
            stderr,
            exit_code,
        }
    }

    /// Text shown to the operator for this run.
    ///
    /// stdout wins, as it is what the tool prints for humans. stderr is used
    /// only when stdout is blank, and a synthesized line when both are.
    pub fn display_text(&self) -> String {
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }

        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }

        match self.exit_code {
            Some(code) => format!("tool exited with status {code}"),
            None => "tool was terminated by a signal".to_string(),
        }
    }
}
