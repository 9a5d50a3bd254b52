//! Tuple Space Engine
//!
//! This module implements the tuple space proper: a directory of payload
//! files coordinated purely through filesystem atoms (exclusive create,
//! same-directory rename, unlink). Every public operation is a short
//! synchronous transaction; concurrency comes from many processes calling
//! into the same directory at once, not from engine-owned threads.
//!
//! ## Design Decisions
//!
//! 1. **Filenames are the protocol**: identity, FIFO order, and expiry all
//!    live in the basename (see [`crate::name`]); payload files carry raw
//!    bytes only.
//! 2. **Lock-free hot path**: publication is write-temp-then-rename, reads
//!    are plain opens, consumption is read-then-best-effort-unlink. Only
//!    sequence allocation takes a lock.
//! 3. **Lazy expiry**: a sweep at the head of every operation unlinks dead
//!    tuples; matchers re-check freshness so a not-yet-swept file is never
//!    returned.
//! 4. **Polling rendezvous**: blocking reads poll every 100 ms. No daemon,
//!    no inotify, no shared memory, so any process on the host can join.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌───────────┐   out: tmp + rename    ┌──────────────────────┐
//! │ process A │ ──────────────────────>│                      │
//! └───────────┘                        │    tuple directory   │
//! ┌───────────┐   inp: read + unlink   │  job-00000001-7f3a…  │
//! │ process B │ <──────────────────────│  job-00000002-c01d…  │
//! └───────────┘                        │  config              │
//! ┌───────────┐   rd: read             │  .job.seq            │
//! │ process C │ <──────────────────────│                      │
//! └───────────┘                        └──────────────────────┘
//! ```
//!
//! Two consumers may race the same tuple: both can read it, exactly one
//! unlink succeeds. The engine promises at-most-one unlink, not
//! exactly-once reads; consumers needing stricter delivery pair `seq` with
//! an idempotent handler.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use crate::name::parser;
use crate::name::types::{self, NameError, TupleName};
use crate::space::expiry::{self, now_epoch};
use crate::sync::lock::LockError;
use crate::sync::seq;

/// Environment variable naming the tuple directory.
pub const DIR_ENV_VAR: &str = "LINDA_DIR";

/// Fallback tuple directory when the environment variable is unset.
pub const DEFAULT_DIR: &str = "/tmp/linda";

/// Sleep between attempts in the blocking read loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors surfaced by tuple space operations.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// The tuple name failed validation
    #[error("invalid tuple name: {0}")]
    InvalidName(#[from] NameError),

    /// Publication options were malformed or contradictory
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A once-mode read found the space empty for this pattern
    #[error("no tuple matching {pattern:?}")]
    NoMatch {
        /// The pattern that failed to match
        pattern: String,
    },

    /// A timed read elapsed without a match
    #[error("timed out after {waited:?} waiting for tuple matching {pattern:?}")]
    Timeout {
        /// The pattern that failed to match
        pattern: String,
        /// Total time spent polling
        waited: Duration,
    },

    /// Sequence allocation failed (lock timeout or lock I/O)
    #[error("sequence allocation failed: {0}")]
    Sequence(#[from] LockError),

    /// Unexpected filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// How a read (`rd`/`inp`) waits for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Block until a match appears (no in-band cancellation)
    #[default]
    Wait,
    /// Single attempt; fail with [`SpaceError::NoMatch`] if empty
    Once,
    /// Poll until this much time has elapsed, then fail with
    /// [`SpaceError::Timeout`]
    Timeout(Duration),
}

impl ReadMode {
    /// Parses a mode word from a call surface: `"once"` or a non-negative
    /// number of seconds. Absence of a word means [`ReadMode::Wait`].
    pub fn parse(word: &str) -> Result<Self, SpaceError> {
        if word == "once" {
            return Ok(ReadMode::Once);
        }
        match word.parse::<u64>() {
            Ok(secs) => Ok(ReadMode::Timeout(Duration::from_secs(secs))),
            Err(_) => Err(SpaceError::InvalidOptions(format!(
                "unknown read mode {word:?} (expected \"once\" or a number of seconds)"
            ))),
        }
    }
}

/// Options controlling a publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutOptions {
    /// Seconds until the tuple expires; 0 means never
    pub ttl_secs: u64,
    /// Allocate a FIFO sequence token
    pub sequenced: bool,
    /// Replacement mode: no random disambiguator, so the rename overwrites
    /// any prior tuple of the same bare name
    pub replace: bool,
}

impl OutOptions {
    /// Parses publication option words: at most one non-negative integer
    /// (the TTL) plus the flags `seq` and `rep`, in any order.
    pub fn parse(words: &[&str]) -> Result<Self, SpaceError> {
        let mut options = OutOptions::default();
        let mut saw_ttl = false;

        for word in words {
            match *word {
                "seq" if options.sequenced => {
                    return Err(SpaceError::InvalidOptions("duplicate seq flag".into()));
                }
                "seq" => options.sequenced = true,
                "rep" if options.replace => {
                    return Err(SpaceError::InvalidOptions("duplicate rep flag".into()));
                }
                "rep" => options.replace = true,
                other => match other.parse::<i64>() {
                    Ok(_) if saw_ttl => {
                        return Err(SpaceError::InvalidOptions(
                            "more than one TTL value".into(),
                        ));
                    }
                    Ok(ttl) if ttl < 0 => {
                        return Err(SpaceError::InvalidOptions(format!(
                            "negative TTL {ttl}"
                        )));
                    }
                    Ok(ttl) => {
                        options.ttl_secs = ttl as u64;
                        saw_ttl = true;
                    }
                    Err(_) => {
                        return Err(SpaceError::InvalidOptions(format!(
                            "unknown option {other:?}"
                        )));
                    }
                },
            }
        }

        options.validate()?;
        Ok(options)
    }

    /// Checks flag compatibility: `seq` and `rep` are mutually exclusive.
    pub fn validate(&self) -> Result<(), SpaceError> {
        if self.sequenced && self.replace {
            return Err(SpaceError::InvalidOptions(
                "seq and rep are mutually exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// Operation counters for one [`TupleSpace`] handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceStats {
    /// Successful publications
    pub outs: u64,
    /// Successful non-consuming reads
    pub reads: u64,
    /// Successful consuming reads
    pub takes: u64,
    /// Tuples removed by this handle's expiry sweeps
    pub expired: u64,
}

/// Configuration for a tuple space handle.
#[derive(Debug, Clone)]
pub struct SpaceConfig {
    /// Directory holding the tuples (created on open if absent)
    pub dir: PathBuf,
    /// Sleep between attempts in blocking reads (default 100 ms)
    pub poll_interval: Duration,
    /// Give up on the sequence lock after this long (default 5 s)
    pub lock_timeout: Duration,
    /// Sleep between sequence lock attempts (default 50 ms)
    pub lock_retry: Duration,
}

impl Default for SpaceConfig {
    /// Reads `LINDA_DIR` (default `/tmp/linda`) and the protocol's standard
    /// intervals.
    fn default() -> Self {
        let dir = std::env::var(DIR_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DIR));
        Self {
            dir,
            poll_interval: POLL_INTERVAL,
            lock_timeout: crate::sync::lock::LOCK_TIMEOUT,
            lock_retry: crate::sync::lock::LOCK_RETRY_INTERVAL,
        }
    }
}

impl SpaceConfig {
    /// Configuration for an explicit directory with standard intervals.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

/// A handle on one tuple space directory.
///
/// The handle is cheap, stateless apart from its counters, and safe to
/// share across threads; every operation is an independent filesystem
/// transaction. Multiple handles, in this process or any other, may
/// point at the same directory.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use lindafs::space::{ReadMode, SpaceConfig, TupleSpace};
///
/// let dir = tempfile::tempdir().unwrap();
/// let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();
///
/// space.out("job", Bytes::from("hello")).unwrap();
/// let payload = space.inp("job", ReadMode::Once).unwrap();
/// assert_eq!(payload, Bytes::from("hello"));
/// ```
pub struct TupleSpace {
    config: SpaceConfig,

    /// Statistics: successful publications
    outs: AtomicU64,
    /// Statistics: successful non-consuming reads
    reads: AtomicU64,
    /// Statistics: successful consuming reads
    takes: AtomicU64,
    /// Statistics: tuples removed by this handle's sweeps
    expired: AtomicU64,
}

impl std::fmt::Debug for TupleSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TupleSpace")
            .field("dir", &self.config.dir)
            .field("outs", &self.outs.load(Ordering::Relaxed))
            .field("reads", &self.reads.load(Ordering::Relaxed))
            .field("takes", &self.takes.load(Ordering::Relaxed))
            .finish()
    }
}

impl TupleSpace {
    /// Opens a tuple space, creating the directory if it does not exist.
    pub fn open(config: SpaceConfig) -> Result<Self, SpaceError> {
        fs::create_dir_all(&config.dir)?;
        debug!(dir = %config.dir.display(), "opened tuple space");
        Ok(Self {
            config,
            outs: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            takes: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        })
    }

    /// Opens the ambient tuple space: `LINDA_DIR` or `/tmp/linda`.
    pub fn ambient() -> Result<Self, SpaceError> {
        Self::open(SpaceConfig::default())
    }

    /// Returns the directory backing this space.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Publishes a tuple with default options (random disambiguator, no
    /// TTL).
    pub fn out(&self, name: &str, data: Bytes) -> Result<(), SpaceError> {
        self.out_with(name, data, OutOptions::default())
    }

    /// Publishes a tuple.
    ///
    /// The payload becomes visible atomically: a temporary file in the same
    /// directory receives all the bytes, then a rename moves it to the
    /// final tuple name. Readers observe either the whole payload or no
    /// file at all.
    ///
    /// In `rep` mode the filename carries no disambiguator, so the rename
    /// overwrites any prior tuple of the same bare name. Mixing `rep` and
    /// non-`rep` publications under one name leaves observation order
    /// undefined; confine `rep` to singleton slots.
    pub fn out_with(
        &self,
        name: &str,
        data: Bytes,
        options: OutOptions,
    ) -> Result<(), SpaceError> {
        options.validate()?;
        let mut tuple = TupleName::new(name)?;
        self.sweep();

        if options.sequenced {
            let seq = seq::next_seq(
                &self.config.dir,
                name,
                self.config.lock_timeout,
                self.config.lock_retry,
            )?;
            tuple = tuple.with_seq(seq);
        }
        if !options.replace {
            tuple = tuple.with_rand(types::random_token());
        }
        if options.ttl_secs > 0 {
            tuple = tuple.with_expiry(now_epoch() + options.ttl_secs);
        }

        let encoded = tuple.encode();
        write_atomic(&self.config.dir.join(&encoded), &data)?;
        self.outs.fetch_add(1, Ordering::Relaxed);
        trace!(tuple = %encoded, bytes = data.len(), "published tuple");
        Ok(())
    }

    /// Reads a matching tuple without removing it.
    ///
    /// Returns an exact snapshot of some tuple that existed at an instant
    /// during the call; the space is never mutated.
    pub fn rd(&self, pattern: &str, mode: ReadMode) -> Result<Bytes, SpaceError> {
        self.read_loop(pattern, mode, false)
    }

    /// Reads a matching tuple and removes it.
    ///
    /// The unlink after the read is best-effort: when two processes race
    /// the same tuple, both may return the payload and exactly one unlink
    /// succeeds. At-most-one unlink is guaranteed; exactly-once reads are
    /// not.
    pub fn inp(&self, pattern: &str, mode: ReadMode) -> Result<Bytes, SpaceError> {
        self.read_loop(pattern, mode, true)
    }

    /// Lists live tuples grouped by logical name.
    ///
    /// Returns `"<count> <name>"` entries sorted by name. An empty pattern
    /// (or bare `"*"`) lists the whole space. Never blocks.
    pub fn ls(&self, pattern: &str) -> Result<Vec<String>, SpaceError> {
        self.sweep();
        let matcher = NamePattern::new(pattern);

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for basename in self.candidates(&matcher)? {
            let name = parser::logical_name(&basename).to_string();
            *counts.entry(name).or_insert(0) += 1;
        }
        Ok(counts
            .iter()
            .map(|(name, count)| format!("{count} {name}"))
            .collect())
    }

    /// Removes every file in the space: tuples, sequence counters, stale
    /// lock sentinels, and stray temporaries.
    ///
    /// Per-file failures are ignored; the operation is not atomic with
    /// respect to concurrent peers. Intended for tests and maintenance.
    pub fn clear(&self) -> Result<(), SpaceError> {
        for entry in fs::read_dir(&self.config.dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let _ = fs::remove_file(entry.path());
        }
        debug!(dir = %self.config.dir.display(), "cleared tuple space");
        Ok(())
    }

    /// Returns a snapshot of this handle's operation counters.
    pub fn stats(&self) -> SpaceStats {
        SpaceStats {
            outs: self.outs.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            takes: self.takes.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }

    /// Runs the lazy expiry sweep, folding removals into the counters.
    fn sweep(&self) {
        let removed = expiry::sweep(&self.config.dir);
        if removed > 0 {
            self.expired.fetch_add(removed, Ordering::Relaxed);
        }
    }

    /// The shared poll loop behind `rd` and `inp`.
    fn read_loop(
        &self,
        pattern: &str,
        mode: ReadMode,
        consume: bool,
    ) -> Result<Bytes, SpaceError> {
        self.sweep();
        let matcher = NamePattern::new(pattern);
        let start = Instant::now();

        loop {
            for basename in self.candidates(&matcher)? {
                let path = self.config.dir.join(&basename);
                match fs::read(&path) {
                    Ok(payload) => {
                        if consume {
                            // Losing this unlink means a peer consumed the
                            // same file first; its copy stands, ours does
                            // too, and at-most-one unlink holds.
                            let _ = fs::remove_file(&path);
                            self.takes.fetch_add(1, Ordering::Relaxed);
                        } else {
                            self.reads.fetch_add(1, Ordering::Relaxed);
                        }
                        trace!(tuple = %basename, consume, "matched tuple");
                        return Ok(Bytes::from(payload));
                    }
                    // Consumed by a peer between listing and open.
                    Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                    Err(err) => return Err(err.into()),
                }
            }

            match mode {
                ReadMode::Once => {
                    return Err(SpaceError::NoMatch {
                        pattern: pattern.to_string(),
                    });
                }
                ReadMode::Timeout(limit) if start.elapsed() >= limit => {
                    return Err(SpaceError::Timeout {
                        pattern: pattern.to_string(),
                        waited: start.elapsed(),
                    });
                }
                _ => {}
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Enumerates live tuples matching the pattern, lexicographically
    /// ascending. Fixed-width sequence tokens make this FIFO order for
    /// sequenced tuples of one name.
    fn candidates(&self, matcher: &NamePattern) -> Result<Vec<String>, SpaceError> {
        let now = now_epoch();
        let mut found = Vec::new();

        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let basename = match file_name.to_str() {
                Some(basename) => basename,
                None => continue,
            };
            if !matcher.matches(basename) {
                continue;
            }
            let parsed = match parser::parse_basename(basename) {
                Ok(parsed) => parsed,
                Err(_) => continue,
            };
            if parsed.is_expired(now) {
                continue;
            }
            found.push(basename.to_string());
        }

        found.sort_unstable();
        Ok(found)
    }
}

/// Prefix matcher for tuple basenames.
///
/// A single trailing `*` is accepted and stripped; any other `*` is
/// literal. The empty pattern matches everything.
struct NamePattern {
    prefix: String,
}

impl NamePattern {
    fn new(pattern: &str) -> Self {
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn matches(&self, basename: &str) -> bool {
        basename.starts_with(&self.prefix)
    }
}

/// Writes `data` to `path` atomically: all the bytes land in a same-
/// directory temporary file first, then one rename publishes them.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)?;
    if let Err(err) = file.write_all(data).and_then(|_| file.flush()) {
        drop(file);
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    drop(file);

    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

/// Temporary name alongside the final path: `<final>.tmp.<pid>.<hex>`.
/// The suffix never parses as a tuple, so half-written files are invisible
/// to matchers.
fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(format!(
        ".tmp.{}.{}",
        std::process::id(),
        types::random_token()
    ));
    PathBuf::from(os)
}
