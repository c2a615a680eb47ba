//! Git command runner for gitlease.
//!
//! Provides a thin wrapper around the git CLI with captured stdout/stderr
//! and structured error handling. All git invocations go through this
//! module; the classification of push and rebase failures lives with the
//! adapter in [`crate::repo`], which passes a classifier into
//! [`run_git_with`].

use crate::error::GitError;
use std::path::Path;
use std::process::{Command, Output};

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Stdout and stderr joined with a newline, the input for substring
    /// classification of push and rebase failures.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// A non-zero git exit, handed to classification callbacks.
#[derive(Debug)]
pub(crate) struct CommandFailure {
    pub command: String,
    pub code: i32,
    pub output: GitOutput,
}

impl CommandFailure {
    /// Combined stdout+stderr of the failed command.
    pub fn combined(&self) -> String {
        self.output.combined()
    }

    /// The generic fallback classification.
    pub fn into_command_error(self) -> GitError {
        let message = if self.output.stderr.is_empty() {
            self.output.stdout
        } else {
            self.output.stderr
        };
        GitError::Command {
            command: self.command,
            code: self.code,
            output: message,
        }
    }
}

/// Run a git command with the specified working directory, mapping any
/// non-zero exit to [`GitError::Command`].
pub(crate) fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput, GitError> {
    run_git_with(cwd, args, CommandFailure::into_command_error)
}

/// Run a git command, classifying a non-zero exit through `classify`.
///
/// `push` and `rebase` use this to map CLI output onto their error
/// taxonomies; every other operation goes through [`run_git`].
pub(crate) fn run_git_with<P, F>(cwd: P, args: &[&str], classify: F) -> Result<GitOutput, GitError>
where
    P: AsRef<Path>,
    F: FnOnce(CommandFailure) -> GitError,
{
    let command = args.first().copied().unwrap_or_default().to_string();

    let output = Command::new("git")
        .current_dir(cwd.as_ref())
        .args(args)
        .output()
        .map_err(|e| GitError::Spawn {
            command: command.clone(),
            source: e,
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else {
        Err(classify(CommandFailure {
            command,
            code: output.status.code().unwrap_or(-1),
            output: git_output,
        }))
    }
}
