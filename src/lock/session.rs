//! Lock sessions: acquire, release, refresh, and observe locks.

use super::record::LockRecord;
use crate::error::{GitError, LockError};
use crate::push;
use crate::repo::Repo;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Injectable wall-clock, enabling deterministic expiry tests.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A process-scoped lock session bound to one working copy.
///
/// The owner identifier is a ULID generated at construction; every record
/// written through this session carries it. A session assumes exclusive
/// access to its working copy for the duration of each operation; two
/// sessions sharing one working copy is a caller bug.
///
/// Each mutating operation is atomic from the caller's perspective: either
/// the remote tip gains exactly one commit and the working copy mirrors it,
/// or both are left as they were before the call.
pub struct Session {
    repo: Repo,
    owner: String,
    clock: Clock,
    max_push_retries: u32,
}

impl Session {
    /// Create a session over the given working copy with a fresh owner id.
    pub fn new(repo: Repo) -> Self {
        Self {
            repo,
            owner: Ulid::new().to_string(),
            clock: Box::new(Utc::now),
            max_push_retries: push::DEFAULT_MAX_RETRIES,
        }
    }

    /// Replace the wall-clock used for record timestamps and expiry checks.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Override the push retry budget
    /// (defaults to [`push::DEFAULT_MAX_RETRIES`]).
    pub fn with_max_push_retries(mut self, retries: u32) -> Self {
        self.max_push_retries = retries;
        self
    }

    /// This session's owner identifier.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The working copy this session operates on.
    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn full_path(&self, lock_path: &str) -> PathBuf {
        self.repo.path().join(lock_path)
    }

    /// Acquire the lock at `lock_path` (relative to the working copy),
    /// valid for `ttl` from now.
    ///
    /// Fails with [`LockError::Conflict`] when another session holds an
    /// unexpired lock or wins the push race. Re-acquiring a lock this
    /// session already holds rewrites the record with fresh timestamps.
    ///
    /// On success the local branch and the remote tip gain exactly one
    /// commit; on failure both are indistinguishable from their pre-call
    /// state.
    pub fn acquire(
        &self,
        lock_path: &str,
        ttl: Duration,
        description: &str,
    ) -> Result<(), LockError> {
        let branch = self.repo.current_branch()?;
        self.repo.pull("origin", &branch)?;

        if let Some(existing) = self.read_lock(lock_path)?
            && existing.owner != self.owner
        {
            return Err(LockError::Conflict { source: None });
        }

        let full_path = self.full_path(lock_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| LockError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let record = LockRecord::new(self.owner.clone(), self.now(), ttl, description);
        fs::write(&full_path, record.to_json()?).map_err(|e| LockError::Io {
            path: full_path.clone(),
            source: e,
        })?;

        if let Err(commit_err) = self
            .repo
            .commit(&format!("Acquire lock on {lock_path}"), &[lock_path])
        {
            remove_lock_file(&full_path);
            return Err(commit_err.into());
        }

        if let Err(push_err) =
            push::push_with_retry_limit(&self.repo, &branch, self.max_push_retries)
        {
            self.undo_last_commit();
            remove_lock_file(&full_path);
            return Err(map_acquire_push_error(push_err));
        }

        Ok(())
    }

    /// Release the lock at `lock_path`.
    ///
    /// Fails with [`LockError::NotOwned`] when the lock is absent, expired,
    /// or held by another session. Push failures are surfaced as-is rather
    /// than downgraded to a conflict: this session owned the lock, so the
    /// caller's view of the world is still valid.
    pub fn release(&self, lock_path: &str) -> Result<(), LockError> {
        let branch = self.repo.current_branch()?;
        self.repo.pull("origin", &branch)?;

        let record = self.read_lock(lock_path)?;
        if !self.owns_lock(record.as_ref()) {
            return Err(LockError::NotOwned {
                owner: record.map(|r| r.owner),
            });
        }

        // Close the window between the ownership check and the delete.
        self.repo.fetch("origin")?;
        self.repo.pull("origin", &branch)?;

        let full_path = self.full_path(lock_path);
        let snapshot = fs::read(&full_path).map_err(|e| LockError::Io {
            path: full_path.clone(),
            source: e,
        })?;
        fs::remove_file(&full_path).map_err(|e| LockError::Io {
            path: full_path.clone(),
            source: e,
        })?;

        if let Err(commit_err) = self
            .repo
            .commit(&format!("Release lock for {lock_path}"), &[lock_path])
        {
            restore_lock_file(&full_path, &snapshot);
            return Err(commit_err.into());
        }

        if let Err(push_err) =
            push::push_with_retry_limit(&self.repo, &branch, self.max_push_retries)
        {
            // Dropping the commit also restores the deleted file.
            self.undo_last_commit();
            return Err(push_err.into());
        }

        Ok(())
    }

    /// Extend the lock's expiry to `new_expiry`, leaving every other field
    /// (unknown ones included) untouched.
    ///
    /// Push failures are surfaced as-is, like [`Session::release`].
    pub fn refresh(&self, lock_path: &str, new_expiry: DateTime<Utc>) -> Result<(), LockError> {
        let branch = self.repo.current_branch()?;
        self.repo.pull("origin", &branch)?;

        let Some(mut record) = self.read_lock(lock_path)? else {
            return Err(LockError::NotOwned { owner: None });
        };
        if record.owner != self.owner {
            return Err(LockError::NotOwned {
                owner: Some(record.owner),
            });
        }

        let full_path = self.full_path(lock_path);
        let snapshot = fs::read(&full_path).map_err(|e| LockError::Io {
            path: full_path.clone(),
            source: e,
        })?;

        record.expires_at = new_expiry;
        fs::write(&full_path, record.to_json()?).map_err(|e| LockError::Io {
            path: full_path.clone(),
            source: e,
        })?;

        if let Err(commit_err) = self
            .repo
            .commit(&format!("Refresh lock for {lock_path}"), &[lock_path])
        {
            restore_lock_file(&full_path, &snapshot);
            return Err(commit_err.into());
        }

        if let Err(push_err) =
            push::push_with_retry_limit(&self.repo, &branch, self.max_push_retries)
        {
            restore_lock_file(&full_path, &snapshot);
            self.undo_last_commit();
            return Err(push_err.into());
        }

        Ok(())
    }

    /// Read the current lock at `lock_path`.
    ///
    /// Returns `None` when no lock file exists or the record has expired.
    /// Never mutates anything: expiry is interpreted at read time, not
    /// enforced by deleting stale records.
    pub fn read_lock(&self, lock_path: &str) -> Result<Option<LockRecord>, LockError> {
        let full_path = self.full_path(lock_path);

        let content = match fs::read_to_string(&full_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(LockError::Io {
                    path: full_path,
                    source: err,
                });
            }
        };

        let record: LockRecord = serde_json::from_str(&content).map_err(|e| LockError::Parse {
            path: full_path,
            source: e,
        })?;

        if record.is_expired(self.now()) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// True iff `record` exists and names this session as owner.
    ///
    /// Pure: touches neither the filesystem nor the remote.
    pub fn owns_lock(&self, record: Option<&LockRecord>) -> bool {
        record.is_some_and(|r| r.owner == self.owner)
    }

    /// Drop the last commit during rollback. The original failure is what
    /// the caller sees; a reset failure is only logged.
    fn undo_last_commit(&self) {
        if let Err(err) = self.repo.reset_hard("HEAD~1") {
            tracing::warn!(%err, "failed to reset after push failure");
        }
    }
}

/// Map a push-engine failure during acquire onto the lock taxonomy.
///
/// Anything that smells of losing a race, including the generic case,
/// is a conflict; only authorization and missing-ref failures keep their
/// own kinds, because retrying those cannot help.
fn map_acquire_push_error(err: GitError) -> LockError {
    match err {
        GitError::PushPermissionDenied { .. } => LockError::PermissionDenied(err),
        GitError::PushRemoteRefMissing { .. } => LockError::Configuration(err),
        _ => LockError::Conflict { source: Some(err) },
    }
}

fn remove_lock_file(path: &Path) {
    if let Err(err) = fs::remove_file(path)
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), %err, "failed to remove lock file during rollback");
    }
}

fn restore_lock_file(path: &Path, snapshot: &[u8]) {
    if let Err(err) = fs::write(path, snapshot) {
        tracing::warn!(path = %path.display(), %err, "failed to restore lock file during rollback");
    }
}
