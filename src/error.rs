//! Error types for gitlease.
//!
//! Two taxonomies live here. [`GitError`] is the VCS adapter's: one variant
//! per classified CLI failure, each carrying the raw command output for
//! diagnostics. [`LockError`] is what the lock protocol surfaces to callers.
//! Both are plain sum types, so "is this failure of kind K?" is an enum
//! match no matter how deeply a cause is wrapped.

use std::path::PathBuf;
use thiserror::Error;

/// Classified failure from the git CLI.
///
/// Push and rebase failures are classified by scanning the combined
/// stdout+stderr of the command; everything that does not match a known
/// pattern lands in [`GitError::Command`].
#[derive(Error, Debug)]
pub enum GitError {
    /// The git binary could not be spawned at all.
    #[error("failed to execute git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A git command exited non-zero without a more specific classification.
    #[error("git {command} failed (exit code {code}): {output}")]
    Command {
        command: String,
        code: i32,
        output: String,
    },

    /// The path handed to [`Repo::open`](crate::repo::Repo::open) is not a
    /// git working copy.
    #[error("not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// HEAD does not name a branch (detached or unborn). `branches` holds
    /// the local branch listing from the secondary query, so callers can
    /// tell this apart from the CLI being unavailable.
    #[error("HEAD does not name a branch; local branches:\n{branches}")]
    UnknownBranch {
        branches: String,
        #[source]
        source: Box<GitError>,
    },

    /// Push rejected because the remote has commits we have not fetched.
    #[error("git push rejected: fetch-first update\n{output}")]
    PushFetchFirst { output: String },

    /// Push rejected as a non-fast-forward update.
    #[error("git push rejected: non-fast-forward update\n{output}")]
    PushNonFastForward { output: String },

    /// Push rejected by the remote for authorization reasons.
    #[error("git push rejected: permission denied\n{output}")]
    PushPermissionDenied { output: String },

    /// Push rejected by the remote or a pre-receive hook.
    #[error("git push rejected\n{output}")]
    PushRejected { output: String },

    /// The remote ref being pushed to does not exist.
    #[error("git push rejected: remote ref does not exist\n{output}")]
    PushRemoteRefMissing { output: String },

    /// Rebase stopped on conflicting changes to the same content.
    #[error("git rebase failed: merge conflict\n{output}")]
    RebaseMergeConflict { output: String },

    /// Another rebase was already in progress.
    #[error("git rebase failed: rebase already in progress\n{output}")]
    RebaseInProgress { output: String },

    /// The rebase completed without applying any commits.
    #[error("git rebase failed: no commits applied\n{output}")]
    RebaseNoCommitsApplied { output: String },
}

/// Failure surfaced at the lock boundary.
#[derive(Error, Debug)]
pub enum LockError {
    /// Another session holds the lock, or we lost a push race that could
    /// not be safely rebased away. Retrying after a backoff is reasonable.
    #[error("lock conflict: resource is already locked")]
    Conflict {
        #[source]
        source: Option<GitError>,
    },

    /// Release or refresh was attempted on a lock this session does not
    /// own. `owner` names the current holder when a record exists.
    #[error("lock is not owned by this session{}", .owner.as_deref().map(|o| format!(" (held by {o})")).unwrap_or_default())]
    NotOwned { owner: Option<String> },

    /// The remote rejected the lock push for authorization reasons.
    /// Retrying will not help; escalate instead.
    #[error("lock push was denied by the remote")]
    PermissionDenied(#[source] GitError),

    /// The remote or branch this session pushes to does not exist.
    #[error("remote ref for the lock branch does not exist")]
    Configuration(#[source] GitError),

    /// Local filesystem failure while reading or writing a lock file.
    #[error("lock file I/O failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A lock file exists but does not parse as a lock record.
    #[error("failed to parse lock file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A lock record could not be serialized.
    #[error("failed to serialize lock record: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// Unclassified failure from the VCS adapter, surfaced as-is.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl LockError {
    /// True when the failure means another session holds the lock; the
    /// caller may retry after a backoff.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LockError::Conflict { .. })
    }
}
