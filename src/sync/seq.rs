//! Per-Name Sequence Allocator
//!
//! FIFO publication needs a counter that is strictly increasing across all
//! cooperating processes. The counter for a tuple name lives in the
//! engine-private file `.<name>.seq` as zero-padded ASCII, and every
//! increment happens under the cross-process [file lock](super::lock) on
//! that file:
//!
//! ```text
//! next_seq("job"):
//!   lock .job.seq        (sentinel .job.seq.lock)
//!   read counter         (absent or unreadable => 0)
//!   write counter + 1    (zero-padded to 8 digits)
//!   unlock
//! ```
//!
//! The zero padding makes lexicographic filename order equal numeric order,
//! which is what gives `inp` its FIFO property without any index structure.
//! The counter wraps nowhere; past 10^8 the token outgrows its fixed width
//! and ordering across the boundary is undefined (`clear` resets it).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{trace, warn};

use crate::name::types::SEQ_WIDTH;
use crate::sync::lock::{self, LockError};

/// Builds the counter path for a tuple name: `<dir>/.<name>.seq`.
pub fn seq_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{name}.seq"))
}

/// Allocates the next sequence value for `name`.
///
/// Values returned for the same name are unique and strictly increasing
/// across every process sharing the directory, in the order the lock was
/// granted.
///
/// # Errors
///
/// [`LockError::Timeout`] if a live peer held the lock for the whole
/// timeout, or [`LockError::Io`] for unexpected filesystem failures.
pub fn next_seq(
    dir: &Path,
    name: &str,
    lock_timeout: Duration,
    lock_retry: Duration,
) -> Result<u64, LockError> {
    let counter_path = seq_file_path(dir, name);
    let guard = lock::acquire(&counter_path, lock_timeout, lock_retry)?;

    let current = match fs::read_to_string(&counter_path) {
        Ok(contents) => contents.trim().parse::<u64>().unwrap_or_else(|_| {
            warn!(
                path = %counter_path.display(),
                "sequence file is unreadable, restarting counter"
            );
            0
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
        Err(err) => return Err(err.into()),
    };

    let next = current + 1;
    fs::write(
        &counter_path,
        format!("{:0width$}", next, width = SEQ_WIDTH),
    )?;
    guard.release();

    trace!(name, seq = next, "allocated sequence");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::lock::{LOCK_RETRY_INTERVAL, LOCK_TIMEOUT};
    use tempfile::tempdir;

    fn next(dir: &Path, name: &str) -> u64 {
        next_seq(dir, name, LOCK_TIMEOUT, LOCK_RETRY_INTERVAL).unwrap()
    }

    #[test]
    fn test_first_allocation_is_one() {
        let dir = tempdir().unwrap();
        assert_eq!(next(dir.path(), "job"), 1);
    }

    #[test]
    fn test_allocations_increase() {
        let dir = tempdir().unwrap();
        assert_eq!(next(dir.path(), "job"), 1);
        assert_eq!(next(dir.path(), "job"), 2);
        assert_eq!(next(dir.path(), "job"), 3);
    }

    #[test]
    fn test_counter_file_is_zero_padded() {
        let dir = tempdir().unwrap();
        next(dir.path(), "job");
        let contents = fs::read_to_string(seq_file_path(dir.path(), "job")).unwrap();
        assert_eq!(contents, "00000001");
    }

    #[test]
    fn test_names_have_independent_counters() {
        let dir = tempdir().unwrap();
        assert_eq!(next(dir.path(), "a"), 1);
        assert_eq!(next(dir.path(), "b"), 1);
        assert_eq!(next(dir.path(), "a"), 2);
    }

    #[test]
    fn test_corrupt_counter_restarts() {
        let dir = tempdir().unwrap();
        fs::write(seq_file_path(dir.path(), "job"), "garbage").unwrap();
        assert_eq!(next(dir.path(), "job"), 1);
    }

    #[test]
    fn test_lock_released_after_allocation() {
        let dir = tempdir().unwrap();
        next(dir.path(), "job");
        let sentinel = lock::sentinel_path(&seq_file_path(dir.path(), "job"));
        assert!(!sentinel.exists());
    }

    #[test]
    fn test_concurrent_allocations_are_unique() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let dir = tempdir().unwrap();
        let path = Arc::new(dir.path().to_path_buf());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut handles = vec![];

        for _ in 0..8 {
            let path = Arc::clone(&path);
            let seen = Arc::clone(&seen);
            handles.push(thread::spawn(move || {
                for _ in 0..25 {
                    let seq =
                        next_seq(&path, "job", LOCK_TIMEOUT, Duration::from_millis(1)).unwrap();
                    seen.lock().unwrap().push(seq);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut values = seen.lock().unwrap().clone();
        values.sort_unstable();
        let expected: Vec<u64> = (1..=200).collect();
        assert_eq!(values, expected);
    }
}
