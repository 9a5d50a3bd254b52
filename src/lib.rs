//! # lindafs - A Filesystem-Backed Linda Tuple Space
//!
//! lindafs lets independent processes on one host publish, peek, and
//! consume named byte payloads ("tuples") using nothing but a shared
//! directory. There is no broker, no daemon, and no socket: filenames
//! encode all metadata, and POSIX filesystem atoms (exclusive create,
//! same-directory rename, unlink) provide the coordination.
//!
//! ## Features
//!
//! - **Five operations**: `out`, `rd`, `inp`, `ls`, `clear`
//! - **TTL expiry**: tuples can carry an absolute expiry in their filename
//! - **FIFO queues**: `seq` mode allocates strictly increasing per-name
//!   counters across all cooperating processes
//! - **Singleton slots**: `rep` mode publishes without a disambiguator so
//!   each write atomically replaces the last
//! - **Blocking reads**: wait forever, try once, or poll with a deadline
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           lindafs                               │
//! │                                                                 │
//! │  ┌──────────────┐      ┌──────────────────────────────────┐     │
//! │  │  CLI binary  │─────>│           TupleSpace             │     │
//! │  │  (main.rs)   │      │   out / rd / inp / ls / clear    │     │
//! │  └──────────────┘      └──────┬────────────┬──────────────┘     │
//! │                               │            │                    │
//! │              ┌────────────────┘            └──────────┐         │
//! │              ▼                                        ▼         │
//! │  ┌────────────────────┐                  ┌─────────────────────┐│
//! │  │     name codec     │                  │   sequence + lock   ││
//! │  │ encode/parse files │                  │ .name.seq / *.lock  ││
//! │  └────────────────────┘                  └─────────────────────┘│
//! │              │                                        │         │
//! │              ▼                                        ▼         │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │             shared tuple directory (LINDA_DIR)              ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use bytes::Bytes;
//! use lindafs::{OutOptions, ReadMode, SpaceConfig, TupleSpace};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();
//!
//! // A tiny FIFO job queue.
//! let fifo = OutOptions { sequenced: true, ..Default::default() };
//! space.out_with("job", Bytes::from("build"), fifo).unwrap();
//! space.out_with("job", Bytes::from("deploy"), fifo).unwrap();
//!
//! assert_eq!(space.inp("job", ReadMode::Once).unwrap(), Bytes::from("build"));
//! assert_eq!(space.inp("job", ReadMode::Once).unwrap(), Bytes::from("deploy"));
//! ```
//!
//! ## Module Overview
//!
//! - [`name`]: filename encoding and decoding, the wire format of the space
//! - [`space`]: the engine: operations, matching, expiry, atomic writes
//! - [`sync`]: the cross-process lock and the FIFO sequence allocator
//!
//! ## Design Highlights
//!
//! ### Lock-Free Hot Path
//!
//! Publication is write-temp-then-rename; reads are plain opens;
//! consumption is read-then-best-effort-unlink. Two consumers racing the
//! same tuple may both see the payload while exactly one unlink wins:
//! the engine guarantees at-most-one unlink, not exactly-once reads.
//! The only lock in the system guards the per-name sequence counter.
//!
//! ### Lazy Expiry
//!
//! Expired tuples are unlinked by a sweep at the head of every operation,
//! and matchers independently re-check freshness, so a stale file is never
//! returned even before it is swept. No background thread exists.
//!
//! ### Polling Rendezvous
//!
//! Blocking reads poll the directory every 100 ms. That latency is the
//! price of having no daemon and no IPC channel; any process that can see
//! the directory can join the conversation.

pub mod name;
pub mod space;
pub mod sync;

// Re-export the primary API at the crate root
pub use name::{NameError, ParseError};
pub use space::{
    OutOptions, ReadMode, SpaceConfig, SpaceError, SpaceStats, TupleSpace, DEFAULT_DIR,
    DIR_ENV_VAR,
};
pub use sync::LockError;

/// Version of lindafs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
