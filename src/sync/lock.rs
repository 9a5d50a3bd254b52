//! Cross-Process File Lock
//!
//! A named advisory mutex built from a single filesystem primitive:
//! exclusive file creation. Locking `<path>` means creating `<path>.lock`
//! with create-new semantics and writing the holder's pid into it; peers
//! that find the sentinel already present read the pid, probe the recorded
//! process for liveness, and reclaim the sentinel if the holder is gone.
//!
//! ## Protocol
//!
//! ```text
//! acquire(path):
//!   loop:
//!     link own pid file to path.lock ── ok ──> hold lock
//!       │ EEXIST
//!       ▼
//!     read pid from path.lock
//!       malformed pid  ──> unlink sentinel, retry now
//!       process gone   ──> unlink sentinel, retry now
//!       process alive  ──> sleep 50 ms, retry until 5 s deadline
//! ```
//!
//! Creation goes through a hard link from a private pid file so the
//! sentinel is never visible half-written: the link either lands with the
//! pid already inside or fails with `EEXIST`. Exclusive creation via link
//! is portable across POSIX filesystems, including most networked ones,
//! and the stale-pid check survives ungraceful holder death. The probe
//! assumes holders share this host's pid namespace; containerized peers
//! must mount a per-namespace tuple directory.
//!
//! This lock serializes sequence-counter updates only. Tuple reads and
//! writes are deliberately lock-free.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use crate::name::types::random_token;

/// Suffix appended to the locked path to form the sentinel name.
pub const LOCK_SUFFIX: &str = ".lock";

/// Default time to keep retrying before giving up.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default sleep between acquisition attempts while the lock is held.
pub const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Errors raised while acquiring a file lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock stayed held by a live process for the whole timeout
    #[error("timed out after {waited:?} acquiring lock {path:?}")]
    Timeout {
        /// Sentinel path that could not be acquired
        path: PathBuf,
        /// How long acquisition was attempted
        waited: Duration,
    },

    /// Unexpected filesystem error while creating or inspecting the sentinel
    #[error("lock I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A held lock. Dropping the guard releases it, so every exit path
/// (including panics and early `?` returns) unlinks the sentinel.
#[derive(Debug)]
pub struct LockGuard {
    sentinel: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Returns the sentinel path backing this guard.
    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    /// Releases the lock explicitly.
    pub fn release(mut self) {
        self.unlink();
    }

    fn unlink(&mut self) {
        if !self.released {
            self.released = true;
            // Unlink errors are ignored: the holder may race a reclaimer
            // that already decided we were dead.
            let _ = fs::remove_file(&self.sentinel);
            trace!(sentinel = %self.sentinel.display(), "released lock");
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.unlink();
    }
}

/// Builds the sentinel path for a locked resource: `<path>.lock`.
pub fn sentinel_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(LOCK_SUFFIX);
    PathBuf::from(os)
}

/// Acquires the advisory lock for `path`.
///
/// # Arguments
///
/// * `path` - The resource to lock; the sentinel is `<path>.lock`
/// * `timeout` - Give up after this long if a live holder keeps the lock
/// * `retry` - Sleep between attempts while the lock is held
///
/// # Returns
///
/// A [`LockGuard`] that releases on drop, or [`LockError::Timeout`].
pub fn acquire(path: &Path, timeout: Duration, retry: Duration) -> Result<LockGuard, LockError> {
    let sentinel = sentinel_path(path);
    let start = Instant::now();

    loop {
        if try_create(&sentinel)? {
            trace!(sentinel = %sentinel.display(), "acquired lock");
            return Ok(LockGuard {
                sentinel,
                released: false,
            });
        }
        if reclaim_if_stale(&sentinel)? {
            // Sentinel gone or reclaimed; race peers for it now.
            continue;
        }

        if start.elapsed() >= timeout {
            return Err(LockError::Timeout {
                path: sentinel,
                waited: start.elapsed(),
            });
        }
        std::thread::sleep(retry);
    }
}

/// One creation attempt: link a private pid file onto the sentinel path.
///
/// # Returns
///
/// `true` if this call created the sentinel (lock acquired), `false` if a
/// sentinel already exists.
fn try_create(sentinel: &Path) -> Result<bool, LockError> {
    let mut staging = sentinel.as_os_str().to_os_string();
    staging.push(format!(".{}.{}", std::process::id(), random_token()));
    let staging = PathBuf::from(staging);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staging)?;
    if let Err(err) = file.write_all(std::process::id().to_string().as_bytes()) {
        drop(file);
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }
    drop(file);

    let linked = fs::hard_link(&staging, sentinel);
    let _ = fs::remove_file(&staging);

    match linked {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Inspects an existing sentinel and unlinks it if its holder is gone.
///
/// # Returns
///
/// `true` if the caller should retry creation immediately (sentinel was
/// already gone, malformed, or held by a dead process), `false` if a live
/// holder still owns the lock.
fn reclaim_if_stale(sentinel: &Path) -> Result<bool, LockError> {
    let contents = match fs::read_to_string(sentinel) {
        Ok(contents) => contents,
        // Holder released between our create attempt and this read.
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err.into()),
    };

    match contents.trim().parse::<i32>() {
        Ok(pid) if pid_is_alive(pid) => Ok(false),
        Ok(pid) => {
            debug!(sentinel = %sentinel.display(), pid, "reclaiming stale lock");
            let _ = fs::remove_file(sentinel);
            Ok(true)
        }
        Err(_) => {
            debug!(sentinel = %sentinel.display(), "reclaiming malformed lock");
            let _ = fs::remove_file(sentinel);
            Ok(true)
        }
    }
}

/// Probes whether a process exists using signal 0.
///
/// EPERM means the process exists but belongs to another user, which still
/// counts as alive.
fn pid_is_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sentinel_path() {
        let path = Path::new("/tmp/space/.job.seq");
        assert_eq!(
            sentinel_path(path),
            PathBuf::from("/tmp/space/.job.seq.lock")
        );
    }

    #[test]
    fn test_acquire_writes_own_pid() {
        let dir = tempdir().unwrap();
        let target = dir.path().join(".job.seq");

        let guard = acquire(&target, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL).unwrap();
        let recorded = fs::read_to_string(guard.sentinel()).unwrap();
        assert_eq!(recorded, std::process::id().to_string());
    }

    #[test]
    fn test_release_removes_sentinel() {
        let dir = tempdir().unwrap();
        let target = dir.path().join(".job.seq");

        let guard = acquire(&target, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL).unwrap();
        let sentinel = guard.sentinel().to_path_buf();
        assert!(sentinel.exists());

        guard.release();
        assert!(!sentinel.exists());
    }

    #[test]
    fn test_drop_removes_sentinel() {
        let dir = tempdir().unwrap();
        let target = dir.path().join(".job.seq");
        let sentinel = sentinel_path(&target);

        {
            let _guard = acquire(&target, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL).unwrap();
            assert!(sentinel.exists());
        }
        assert!(!sentinel.exists());
    }

    #[test]
    fn test_held_lock_times_out() {
        let dir = tempdir().unwrap();
        let target = dir.path().join(".job.seq");

        let _guard = acquire(&target, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL).unwrap();

        // Same process, so the pid in the sentinel is alive.
        let result = acquire(
            &target,
            Duration::from_millis(120),
            Duration::from_millis(20),
        );
        assert!(matches!(result, Err(LockError::Timeout { .. })));
    }

    #[test]
    fn test_reclaims_dead_holder() {
        let dir = tempdir().unwrap();
        let target = dir.path().join(".job.seq");
        let sentinel = sentinel_path(&target);

        // A pid far above any real pid space stands in for a dead holder.
        fs::write(&sentinel, "999999999").unwrap();

        let guard = acquire(&target, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL).unwrap();
        let recorded = fs::read_to_string(guard.sentinel()).unwrap();
        assert_eq!(recorded, std::process::id().to_string());
    }

    #[test]
    fn test_reclaims_malformed_sentinel() {
        let dir = tempdir().unwrap();
        let target = dir.path().join(".job.seq");
        let sentinel = sentinel_path(&target);

        fs::write(&sentinel, "not-a-pid").unwrap();

        let guard = acquire(&target, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL);
        assert!(guard.is_ok());
    }

    #[test]
    fn test_contended_acquire_serializes() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let target = Arc::new(dir.path().join(".job.seq"));
        let mut handles = vec![];

        for _ in 0..4 {
            let target = Arc::clone(&target);
            handles.push(thread::spawn(move || {
                for _ in 0..10 {
                    let guard =
                        acquire(&target, LOCK_TIMEOUT, Duration::from_millis(1)).unwrap();
                    guard.release();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(!sentinel_path(&target).exists());
    }
}
