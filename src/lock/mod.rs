//! Advisory locks over a shared Git repository.
//!
//! A lock is a JSON record committed at a well-known path; mutual
//! exclusion comes from the remote's refusal to accept non-fast-forward
//! pushes. Acquiring drafts the record locally, commits it, and hands the
//! commit to the push engine; if the push ultimately loses, the local
//! branch and working tree are rolled back so a failed acquisition is
//! indistinguishable from never having tried.
//!
//! # Lock records
//!
//! Each record carries:
//! - `owner`: the session's ULID, unique per process
//! - `created_at` / `expires_at`: RFC 3339 timestamps
//! - `description`: optional free-form note
//!
//! A record whose expiry has passed grants nothing: readers treat it as
//! absent, and any session may acquire over it. Expiry is interpreted at
//! read time, never enforced by deleting stale files.
//!
//! # Waiting
//!
//! The protocol never blocks waiting for a lock. A contended acquire
//! fails fast with [`LockError::Conflict`](crate::error::LockError); the
//! backoff-and-retry policy belongs to the caller.

mod record;
mod session;


pub use record::LockRecord;
pub use session::{Clock, Session};
