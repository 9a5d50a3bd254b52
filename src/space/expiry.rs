//! Lazy Expiry Sweep
//!
//! Tuples carry their expiry in the filename, so reclaiming dead tuples is
//! a single pass over the directory with no daemon and no locks. The sweep
//! runs at the head of every public operation; between sweeps, matchers
//! apply the same freshness test themselves, so a stale-but-undeleted file
//! is never returned to a caller either way.
//!
//! ## Error Policy
//!
//! Everything here is best-effort. A file that vanishes mid-sweep was
//! removed by a peer; an unlink that fails will be retried by whichever
//! process sweeps next. Only tuples are touched: bookkeeping files and
//! sidecars never parse as tuples and are left alone.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::name::parser;

/// Wall-clock seconds since the Unix epoch.
///
/// Expiry timestamps are encoded in filenames at second resolution; this is
/// the single clock the engine compares them against.
pub(crate) fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Unlinks every tuple in `dir` whose expiry is at or before now.
///
/// # Returns
///
/// The number of tuples removed. Enumeration or unlink failures count as
/// "nothing removed" rather than errors; the sweep never blocks an
/// operation.
pub fn sweep(dir: &Path) -> u64 {
    let now = now_epoch();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut removed = 0u64;
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let basename = match file_name.to_str() {
            Some(basename) => basename,
            None => continue,
        };
        let parsed = match parser::parse_basename(basename) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };
        if parsed.is_expired(now) && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }

    if removed > 0 {
        debug!(removed, dir = %dir.display(), "swept expired tuples");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sweep_removes_expired_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old-deadbeef.1000"), b"stale").unwrap();
        fs::write(dir.path().join("new-deadbeef.99999999999"), b"fresh").unwrap();
        fs::write(dir.path().join("forever-deadbeef"), b"immortal").unwrap();

        let removed = sweep(dir.path());

        assert_eq!(removed, 1);
        assert!(!dir.path().join("old-deadbeef.1000").exists());
        assert!(dir.path().join("new-deadbeef.99999999999").exists());
        assert!(dir.path().join("forever-deadbeef").exists());
    }

    #[test]
    fn test_sweep_ignores_bookkeeping_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".job.seq"), b"00000001").unwrap();
        fs::write(dir.path().join(".job.seq.lock"), b"1234").unwrap();
        fs::write(dir.path().join("job-deadbeef.tmp.1234.0badcafe"), b"x").unwrap();

        assert_eq!(sweep(dir.path()), 0);
        assert!(dir.path().join(".job.seq").exists());
        assert!(dir.path().join(".job.seq.lock").exists());
        assert!(dir.path().join("job-deadbeef.tmp.1234.0badcafe").exists());
    }

    #[test]
    fn test_sweep_missing_directory_is_noop() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("nothing-here");
        assert_eq!(sweep(&gone), 0);
    }

    #[test]
    fn test_sweep_replacement_tuple_with_expiry() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("slot.1000"), b"stale singleton").unwrap();

        assert_eq!(sweep(dir.path()), 1);
        assert!(!dir.path().join("slot.1000").exists());
    }
}
