//! Distributed advisory locks on top of an ordinary Git remote.
//!
//! A lock is a JSON file committed at a well-known path in a shared
//! repository. Mutual exclusion is not invented here: it falls out of the
//! remote's fast-forward push rule. Whoever lands their lock commit first
//! wins; everyone else gets a push rejection, which this crate translates
//! into a lock-contention error after attempting to rebase away merely
//! concurrent (non-conflicting) commits.
//!
//! The crate has three layers:
//! - [`repo`]: a typed adapter over the local git CLI, classifying push
//!   and rebase failures into the [`error::GitError`] taxonomy.
//! - [`push`]: a bounded-retry engine that reconciles a local commit with
//!   concurrent remote history via fetch + rebase + re-push.
//! - [`lock`]: the protocol itself (acquire, release, refresh, and read),
//!   with rollback so a failed operation leaves no trace locally.
//!
//! Everything is synchronous and blocking; there are no background tasks.
//! Waiting and backoff between contended attempts belong to the caller.
//!
//! ```no_run
//! use chrono::Duration;
//! use gitlease::{Repo, Session};
//!
//! # fn main() -> Result<(), gitlease::LockError> {
//! let repo = Repo::open("/path/to/working/copy")?;
//! let session = Session::new(repo);
//!
//! session.acquire("locks/deploy.lock", Duration::minutes(10), "deploying")?;
//! // ... critical section ...
//! session.release("locks/deploy.lock")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod git;
pub mod lock;
pub mod push;
pub mod repo;

#[cfg(test)]
mod test_support;

pub use error::{GitError, LockError};
pub use lock::{LockRecord, Session};
pub use push::push_with_retry;
pub use repo::{CloneOptions, Repo, ResetMode};
