//! Cross-Process Coordination Primitives
//!
//! The tuple space deliberately keeps its hot path lock-free; the one
//! resource that needs mutual exclusion is the per-name sequence counter
//! behind FIFO publication.
//!
//! ```text
//!           next_seq("job")
//!                 │
//!                 ▼
//!      ┌─────────────────────┐     exclusive create
//!      │  lock .job.seq      │────────────────────────┐
//!      └──────────┬──────────┘                        ▼
//!                 │                          .job.seq.lock (pid)
//!                 ▼
//!      read / increment / rewrite .job.seq
//!                 │
//!                 ▼
//!              unlock
//! ```
//!
//! ## Modules
//!
//! - `lock`: advisory lock via exclusive sentinel creation, with
//!   stale-holder reclamation
//! - `seq`: the strictly increasing per-name counter built on that lock

pub mod lock;
pub mod seq;

// Re-export commonly used items
pub use lock::{acquire, LockError, LockGuard, LOCK_RETRY_INTERVAL, LOCK_TIMEOUT};
pub use seq::{next_seq, seq_file_path};
