//! Tuple Space Module
//!
//! The engine behind the five public operations: publish (`out`), peek
//! (`rd`), consume (`inp`), list (`ls`), and wipe (`clear`), all expressed
//! as short transactions against a shared directory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TupleSpace                           │
//! │                                                             │
//! │  out ──> sweep ──> encode name ──> atomic write (tmp+mv)    │
//! │  rd  ──> sweep ──> match ──> read ───────────────┐          │
//! │  inp ──> sweep ──> match ──> read ──> unlink     │          │
//! │                      │                           ▼          │
//! │                      └── empty? sleep 100 ms, retry         │
//! └─────────────────────────────────────────────────────────────┘
//!                             ▲
//!                             │ lazy, at the head of every op
//!              ┌──────────────┴──────────────┐
//!              │        expiry sweep         │
//!              │ (no daemon, no locks, O(n)) │
//!              └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use lindafs::space::{ReadMode, SpaceConfig, TupleSpace};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();
//!
//! space.out("slot", Bytes::from("value")).unwrap();
//! assert_eq!(space.ls("").unwrap(), vec!["1 slot".to_string()]);
//! ```

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{
    OutOptions, ReadMode, SpaceConfig, SpaceError, SpaceStats, TupleSpace, DEFAULT_DIR,
    DIR_ENV_VAR, POLL_INTERVAL,
};
pub use expiry::sweep;
