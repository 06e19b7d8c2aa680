//! Backup naming, sequence discovery and retention pruning
//!
//! Backups are `<path>.<N>` or `<path>.<N>.<suffix>` once compressed. No
//! counter is persisted: the next `N` is recomputed from the directory on
//! every rotation, so gaps left by pruning or manual deletion are harmless.

use logroll_core::Result;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the path for a rotated backup
pub fn backup_path(base: &Path, seq: u64) -> PathBuf {
    with_extra_suffix(base, &seq.to_string())
}

/// Get the path for a compressed rotated backup
pub fn compressed_backup_path(base: &Path, seq: u64, suffix: &str) -> PathBuf {
    with_extra_suffix(base, &format!("{}.{}", seq, suffix))
}

/// Append `.<extra>` to the full file name (unlike `Path::with_extension`)
pub(crate) fn with_extra_suffix(base: &Path, extra: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(extra);
    PathBuf::from(name)
}

/// Extract the sequence number from a backup file name.
///
/// The last dot-separated segment is the number, unless it equals the
/// compressed suffix, in which case the segment before it is used.
pub fn parse_sequence(name: &str, suffix: &str) -> Option<u64> {
    let mut segments = name.rsplit('.');
    let last = segments.next()?;
    let number = if !suffix.is_empty() && last == suffix {
        segments.next()?
    } else {
        last
    };
    number.parse().ok()
}

/// Scan `<base>.*` and return one past the highest sequence number found
pub fn next_sequence(base: &Path, suffix: &str) -> Result<u64> {
    let pattern = format!(
        "{}.*",
        glob::Pattern::escape(&base.to_string_lossy())
    );

    let mut max_seq = 0;
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                debug!("Skipping unreadable backup candidate: {}", e);
                continue;
            }
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(seq) = parse_sequence(name, suffix) {
            max_seq = max_seq.max(seq);
        }
    }

    Ok(max_seq.saturating_add(1))
}

/// Delete backups older than the retention window ending at `newest`.
///
/// Walks downward from `newest - keep`, removing both the plain and the
/// compressed form of each sequence number, and stops at the first number
/// where nothing was removed. `keep == 0` disables pruning. Returns the
/// sequence numbers that were removed.
pub fn prune_backups(base: &Path, newest: u64, keep: usize, suffix: &str) -> Vec<u64> {
    let mut pruned = Vec::new();
    if keep == 0 {
        return pruned;
    }

    let mut seq = newest.saturating_sub(keep as u64);
    while seq >= 1 {
        let plain = fs::remove_file(backup_path(base, seq)).is_ok();
        let compressed =
            !suffix.is_empty() && fs::remove_file(compressed_backup_path(base, seq, suffix)).is_ok();

        if !plain && !compressed {
            break;
        }

        debug!("Pruned backup {} of {}", seq, base.display());
        pruned.push(seq);
        seq -= 1;
    }

    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn test_backup_path() {
        let base = PathBuf::from("/var/log/app.log");
        assert_eq!(backup_path(&base, 1), PathBuf::from("/var/log/app.log.1"));
        assert_eq!(backup_path(&base, 12), PathBuf::from("/var/log/app.log.12"));
        assert_eq!(
            compressed_backup_path(&base, 3, "gz"),
            PathBuf::from("/var/log/app.log.3.gz")
        );
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("app.log.4", "gz"), Some(4));
        assert_eq!(parse_sequence("app.log.17.gz", "gz"), Some(17));
        assert_eq!(parse_sequence("app.log.bak", "gz"), None);
        assert_eq!(parse_sequence("app.log.gz", "gz"), None);
        assert_eq!(parse_sequence("app.log.5.zst", "gz"), None);
    }

    #[test]
    fn test_parse_sequence_without_suffix() {
        assert_eq!(parse_sequence("app.log.9", ""), Some(9));
        assert_eq!(parse_sequence("app.log.9.gz", ""), None);
    }

    #[test]
    fn test_next_sequence_empty_dir() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        assert_eq!(next_sequence(&base, "gz").unwrap(), 1);
    }

    #[test]
    fn test_next_sequence_tolerates_foreign_files() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        touch(&base);
        touch(&backup_path(&base, 2));
        touch(&compressed_backup_path(&base, 7, "gz"));
        touch(&dir.path().join("app.log.old"));
        touch(&dir.path().join("app.log.tmp.swp"));
        touch(&dir.path().join("other.log.99"));

        assert_eq!(next_sequence(&base, "gz").unwrap(), 8);
    }

    #[test]
    fn test_next_sequence_escapes_glob_metacharacters() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app[1].log");
        touch(&backup_path(&base, 3));
        touch(&dir.path().join("app1.log.50"));

        assert_eq!(next_sequence(&base, "gz").unwrap(), 4);
    }

    #[test]
    fn test_prune_keeps_window() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        for seq in 1..=5 {
            touch(&backup_path(&base, seq));
        }

        let pruned = prune_backups(&base, 5, 2, "gz");
        assert_eq!(pruned, vec![3, 2, 1]);
        for seq in 1..=3 {
            assert!(!backup_path(&base, seq).exists());
        }
        assert!(backup_path(&base, 4).exists());
        assert!(backup_path(&base, 5).exists());
    }

    #[test]
    fn test_prune_removes_compressed_forms() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        touch(&compressed_backup_path(&base, 1, "gz"));
        touch(&compressed_backup_path(&base, 2, "gz"));
        touch(&backup_path(&base, 3));
        touch(&compressed_backup_path(&base, 4, "gz"));
        touch(&backup_path(&base, 5));

        prune_backups(&base, 5, 2, "gz");
        assert!(!compressed_backup_path(&base, 1, "gz").exists());
        assert!(!compressed_backup_path(&base, 2, "gz").exists());
        assert!(!backup_path(&base, 3).exists());
        assert!(compressed_backup_path(&base, 4, "gz").exists());
        assert!(backup_path(&base, 5).exists());
    }

    #[test]
    fn test_prune_stops_at_gap() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        touch(&backup_path(&base, 1));
        touch(&backup_path(&base, 3));
        touch(&backup_path(&base, 4));

        let pruned = prune_backups(&base, 4, 1, "gz");
        assert_eq!(pruned, vec![3]);
        assert!(backup_path(&base, 1).exists());
    }

    #[test]
    fn test_prune_unlimited() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        for seq in 1..=3 {
            touch(&backup_path(&base, seq));
        }

        assert!(prune_backups(&base, 3, 0, "gz").is_empty());
        assert!(backup_path(&base, 1).exists());
    }

    #[test]
    fn test_prune_never_touches_newest() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("app.log");
        touch(&backup_path(&base, 1));

        assert!(prune_backups(&base, 1, 1, "gz").is_empty());
        assert!(prune_backups(&base, 1, 5, "gz").is_empty());
        assert!(backup_path(&base, 1).exists());
    }
}
