//! Conflict-resolution push engine.
//!
//! Pushing a lock commit races with every other session pushing to the
//! same branch. The engine converts *non-conflicting* concurrent commits
//! into success: on a fetch-first or non-fast-forward rejection it fetches
//! the remote, rebases the local branch onto the updated tip, and pushes
//! again, up to a fixed retry budget. A rebase failure means *conflicting*
//! concurrency: two sessions touched the same content. That is returned
//! immediately, because retrying would reproduce the same conflict.

use crate::error::GitError;
use crate::repo::Repo;

/// Retry budget after the initial push attempt (three attempts total).
///
/// Deliberately small: under pathological contention the engine should
/// degrade to a fast failure, not a livelock.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Push `branch` to `origin`, reconciling non-conflicting concurrent
/// commits along the way.
///
/// Returns the last classified [`GitError`] when the budget is exhausted
/// or a non-retryable failure occurs.
pub fn push_with_retry(repo: &Repo, branch: &str) -> Result<(), GitError> {
    push_with_retry_limit(repo, branch, DEFAULT_MAX_RETRIES)
}

/// As [`push_with_retry`], with an explicit retry budget.
pub fn push_with_retry_limit(
    repo: &Repo,
    branch: &str,
    max_retries: u32,
) -> Result<(), GitError> {
    let upstream = format!("refs/remotes/origin/{branch}");
    let mut attempt = 0;

    loop {
        let err = match repo.push("origin", branch) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        // Only a remote that advanced underneath us is worth a retry.
        let retryable = matches!(
            err,
            GitError::PushFetchFirst { .. } | GitError::PushNonFastForward { .. }
        );
        if !retryable || attempt >= max_retries {
            return Err(err);
        }
        attempt += 1;
        tracing::debug!(branch, attempt, %err, "push rejected; rebasing onto remote tip");

        // Recovery failures consume the retry; the next attempt pushes again.
        if let Err(fetch_err) = repo.fetch("origin") {
            tracing::warn!(%fetch_err, "fetch before rebase failed");
            continue;
        }
        if let Err(abort_err) = repo.rebase_abort() {
            tracing::warn!(%abort_err, "could not clear stale rebase state");
            continue;
        }
        if let Err(rebase_err) = repo.rebase(&upstream) {
            // A lock operation is a single-file commit, so a rebase conflict
            // means another session changed the same lock file: definitive
            // contention. Abort best-effort and stop.
            if let Err(abort_err) = repo.rebase_abort() {
                tracing::warn!(%abort_err, "failed to abort rebase after conflict");
            }
            return Err(rebase_err);
        }
    }
}
