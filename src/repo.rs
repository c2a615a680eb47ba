//! VCS adapter: a typed surface over one git working copy.
//!
//! Every operation shells out to the git CLI, blocks until it completes,
//! and never retries; retrying belongs to [`crate::push`]. Push and rebase
//! failures are classified into the [`GitError`] taxonomy by scanning the
//! command's combined output for known substrings, which is the only place
//! in the crate that string-matches error text.

use crate::error::GitError;
use crate::git::{CommandFailure, GitOutput, run_git, run_git_with};
use std::path::{Path, PathBuf};

/// Options for [`Repo::clone_with`].
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// URL (or local path) of the repository to clone.
    pub url: String,
    /// Destination directory for the working copy.
    pub destination: PathBuf,
    /// Depth for a shallow clone (`None` = full history).
    pub depth: Option<u32>,
    /// Branch to check out after cloning (`None` = remote default).
    pub branch: Option<String>,
}

/// Git reset modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Keep changes in the working tree and index.
    Soft,
    /// Keep changes in the working tree but not the index.
    Mixed,
    /// Discard all changes.
    Hard,
}

impl ResetMode {
    fn as_flag(self) -> &'static str {
        match self {
            ResetMode::Soft => "--soft",
            ResetMode::Mixed => "--mixed",
            ResetMode::Hard => "--hard",
        }
    }
}

/// A handle to one git working copy.
#[derive(Debug)]
pub struct Repo {
    path: PathBuf,
}

impl Repo {
    /// Bind to an existing working copy.
    ///
    /// Fails with [`GitError::NotARepository`] when `path` has no `.git`
    /// entry (a plain directory, or a path that does not exist).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        if !path.join(".git").exists() {
            return Err(GitError::NotARepository {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Create an empty repository at `path` with the given default branch.
    pub fn init<P: AsRef<Path>>(path: P, default_branch: &str) -> Result<Self, GitError> {
        let path = path.as_ref();
        let branch_arg = format!("--initial-branch={default_branch}");
        let dest = path.to_string_lossy();
        run_git(".", &["init", &branch_arg, &dest])?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Create a bare repository at `path`, suitable as a shared remote.
    pub fn init_bare<P: AsRef<Path>>(path: P, default_branch: &str) -> Result<Self, GitError> {
        let path = path.as_ref();
        let branch_arg = format!("--initial-branch={default_branch}");
        let dest = path.to_string_lossy();
        run_git(".", &["init", "--bare", &branch_arg, &dest])?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Clone `url` into `destination` and bind to the result.
    pub fn clone<P: AsRef<Path>>(url: &str, destination: P) -> Result<Self, GitError> {
        Self::clone_with(&CloneOptions {
            url: url.to_string(),
            destination: destination.as_ref().to_path_buf(),
            ..CloneOptions::default()
        })
    }

    /// Clone with explicit options (shallow depth, initial branch).
    pub fn clone_with(options: &CloneOptions) -> Result<Self, GitError> {
        let mut args: Vec<String> = vec!["clone".to_string()];
        if let Some(depth) = options.depth {
            args.push(format!("--depth={depth}"));
        }
        if let Some(branch) = &options.branch {
            args.push("-b".to_string());
            args.push(branch.clone());
        }
        args.push(options.url.clone());
        args.push(options.destination.to_string_lossy().to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        run_git(".", &arg_refs)?;

        Ok(Self {
            path: options.destination.clone(),
        })
    }

    /// Path of the working copy this handle is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        run_git(&self.path, args)
    }

    /// Stage the named paths and record a commit.
    ///
    /// Fails if nothing ends up staged, if a path is outside the working
    /// copy, or if the CLI reports any other error. No rollback.
    pub fn commit(&self, message: &str, paths: &[&str]) -> Result<(), GitError> {
        for path in paths {
            self.git(&["add", path])?;
        }
        self.git(&["commit", "-m", message])?;
        Ok(())
    }

    /// Stage everything and commit.
    pub fn commit_all(&self, message: &str) -> Result<(), GitError> {
        self.git(&["add", "--all"])?;
        self.git(&["commit", "-m", message])?;
        Ok(())
    }

    /// Retrieve refs from `remote` into the local object store.
    pub fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.git(&["fetch", remote])?;
        Ok(())
    }

    /// Shallow fetch limited to `depth` commits per ref.
    pub fn fetch_with_depth(&self, remote: &str, depth: u32) -> Result<(), GitError> {
        let depth_arg = format!("--depth={depth}");
        self.git(&["fetch", &depth_arg, remote])?;
        Ok(())
    }

    /// Fetch and fast-forward/merge `remote/branch` into the current branch.
    pub fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.git(&["pull", remote, branch])?;
        Ok(())
    }

    /// Push the branch to `remote`, classifying rejection.
    ///
    /// Fetches first so the local refs are current and the CLI reports
    /// precise rejection reasons, then pushes in porcelain mode. A non-zero
    /// exit is classified per the push taxonomy; unmatched output becomes
    /// [`GitError::Command`].
    pub fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.fetch(remote)?;
        run_git_with(
            &self.path,
            &["push", "--porcelain", remote, branch],
            classify_push,
        )?;
        Ok(())
    }

    /// Replay the current branch onto `upstream`, classifying failure.
    pub fn rebase(&self, upstream: &str) -> Result<(), GitError> {
        run_git_with(&self.path, &["rebase", upstream], classify_rebase)?;
        Ok(())
    }

    /// Cancel any in-progress rebase.
    ///
    /// Safe to invoke when no rebase is in progress: git exits non-zero
    /// for that, but it means there was nothing to abort, so it is treated
    /// as success and only logged.
    pub fn rebase_abort(&self) -> Result<(), GitError> {
        match self.git(&["rebase", "--abort"]) {
            Ok(_) => Ok(()),
            Err(GitError::Command { output, .. })
                if output.to_lowercase().contains("no rebase in progress") =>
            {
                tracing::debug!(%output, "rebase --abort ran with no rebase in progress");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Reset the current branch to `target`.
    pub fn reset(&self, mode: ResetMode, target: &str) -> Result<(), GitError> {
        self.git(&["reset", mode.as_flag(), target])?;
        Ok(())
    }

    /// Hard-reset index and working tree to `target` (commonly `HEAD~1`).
    /// Destructive; the lock protocol uses this for rollback.
    pub fn reset_hard(&self, target: &str) -> Result<(), GitError> {
        self.reset(ResetMode::Hard, target)
    }

    /// Switch to the named branch.
    pub fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.git(&["checkout", branch])?;
        Ok(())
    }

    /// Create a new branch at the current HEAD without switching to it.
    pub fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        self.git(&["branch", branch])?;
        Ok(())
    }

    /// Short symbolic name of the current branch.
    ///
    /// When the primary query fails (unborn or otherwise unusual HEAD), a
    /// secondary `branch --list` probe distinguishes "repository reachable
    /// but HEAD is not a branch" ([`GitError::UnknownBranch`]) from the CLI
    /// being unavailable (the probe's own error).
    pub fn current_branch(&self) -> Result<String, GitError> {
        match self.git(&["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(output) => Ok(output.stdout),
            Err(primary) => {
                let branches = self.git(&["branch", "--list"])?;
                Err(GitError::UnknownBranch {
                    branches: branches.stdout,
                    source: Box::new(primary),
                })
            }
        }
    }
}

/// Map a failed `git push` onto the push error taxonomy.
///
/// The match order mirrors the specificity of git's messages: a rejection
/// line usually carries both a `[rejected]` marker and a reason, so the
/// reason substrings are checked first.
fn classify_push(failure: CommandFailure) -> GitError {
    let output = failure.combined();
    if output.contains("fetch first") {
        GitError::PushFetchFirst { output }
    } else if output.contains("non-fast-forward") {
        GitError::PushNonFastForward { output }
    } else if output.contains("permission denied") || output.contains("access denied") {
        GitError::PushPermissionDenied { output }
    } else if output.contains("! [remote rejected]") || output.contains("! [rejected]") {
        GitError::PushRejected { output }
    } else if output.contains("couldn't find remote ref") || output.contains("remote ref does not exist")
    {
        GitError::PushRemoteRefMissing { output }
    } else {
        failure.into_command_error()
    }
}

/// Map a failed `git rebase` onto the rebase error taxonomy.
fn classify_rebase(failure: CommandFailure) -> GitError {
    let output = failure.combined();
    if output.contains("CONFLICT") || output.contains("Merge conflict") {
        GitError::RebaseMergeConflict { output }
    } else if output.contains("already in progress") || output.contains("rebase-merge directory") {
        GitError::RebaseInProgress { output }
    } else if output.contains("no commits applied") {
        GitError::RebaseNoCommitsApplied { output }
    } else {
        failure.into_command_error()
    }
}
