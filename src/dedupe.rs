//! Content-based duplicate detection between two trees
//!
//! The reference tree is indexed by content digest first and never touched.
//! Every file in the check tree whose digest appears in the index is a
//! duplicate, whatever its name, and is deleted unless running dry.

use crate::error::{Error, Result};
use crate::hash::{ContentDigest, compute_file_digest};
use crate::report::{DuplicateReport, OperationLog};
use crate::walk::walk;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span, warn};

/// Digest to first-seen reference file (relative to the reference root)
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    entries: HashMap<ContentDigest, PathBuf>,
}

impl DuplicateIndex {
    /// Hash every readable file under `reference_dir`
    ///
    /// Unreadable files are logged and left out. When several reference
    /// files share content, the first one walked is kept.
    pub fn build(reference_dir: &Path, log: &mut OperationLog) -> Self {
        let mut entries = HashMap::new();

        for item in walk(reference_dir) {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable reference entry");
                    log.push(format!("Error reading entry: {}", e));
                    continue;
                }
            };

            match compute_file_digest(&entry.absolute_path) {
                Ok(digest) => {
                    entries.entry(digest).or_insert(entry.relative_path);
                }
                Err(e) => {
                    warn!(path = ?entry.absolute_path, error = %e, "Skipping unreadable reference file");
                    log.push(format!(
                        "Error reading file '{}': {}",
                        entry.absolute_path.display(),
                        e
                    ));
                }
            }
        }

        Self { entries }
    }

    /// Reference file with this content, if any
    pub fn lookup(&self, digest: &ContentDigest) -> Option<&Path> {
        self.entries.get(digest).map(PathBuf::as_path)
    }

    /// Number of distinct contents indexed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Find files in `check_dir` whose content exists in `reference_dir`
///
/// With `dry_run` the matches are only reported.
pub fn find_duplicates(
    reference_dir: &Path,
    check_dir: &Path,
    dry_run: bool,
) -> Result<DuplicateReport> {
    let _span = span!(Level::INFO, "find_duplicates", ?reference_dir, ?check_dir, dry_run).entered();

    for dir in [reference_dir, check_dir] {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
    }

    let mut report = DuplicateReport::default();
    report.log.push("Starting duplicate scan...");
    report.log.push(format!(
        "Indexing files in reference directory: '{}'...",
        reference_dir.display()
    ));

    let index = DuplicateIndex::build(reference_dir, &mut report.log);
    info!(unique = index.len(), "Indexed reference directory");
    report.log.push(format!(
        "Indexing complete. Found {} unique files in reference.",
        index.len()
    ));
    report.log.push(format!(
        "Checking for exact file duplicates in directory: '{}'...",
        check_dir.display()
    ));

    for item in walk(check_dir) {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                report.failed += 1;
                report.log.push(format!("Error checking entry: {}", e));
                continue;
            }
        };
        let path = &entry.absolute_path;

        let digest = match compute_file_digest(path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(?path, error = %e, "Failed to hash file");
                report.failed += 1;
                report
                    .log
                    .push(format!("Error checking file '{}': {}", path.display(), e));
                continue;
            }
        };

        let Some(original) = index.lookup(&digest) else {
            continue;
        };

        report.found += 1;
        debug!(?path, ?original, "Duplicate found");
        report.log.push(format!(
            "Duplicate found: '{}' (matches '{}')",
            path.display(),
            original.display()
        ));

        if dry_run {
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                report.deleted += 1;
                info!(?path, "Deleted duplicate");
                report.log.push(format!("Deleted: '{}'", path.display()));
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to delete duplicate");
                report.failed += 1;
                report
                    .log
                    .push(format!("Error deleting '{}': {}", path.display(), e));
            }
        }
    }

    info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Relative path -> content of every file under `root`
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        walk(root)
            .map(|e| e.unwrap())
            .map(|e| (e.relative_path, fs::read(e.absolute_path).unwrap()))
            .collect()
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        let check = dir.path().join("check");
        fs::create_dir_all(reference.join("nested")).unwrap();
        fs::create_dir_all(check.join("deep")).unwrap();

        fs::write(reference.join("original.jpg"), b"same bytes").unwrap();
        fs::write(reference.join("nested/other.txt"), b"other bytes").unwrap();
        fs::write(check.join("renamed_copy.png"), b"same bytes").unwrap();
        fs::write(check.join("deep/another.bin"), b"other bytes").unwrap();
        fs::write(check.join("unique.txt"), b"only here").unwrap();

        (dir, reference, check)
    }

    #[test]
    fn test_matches_by_content_regardless_of_name() {
        let (_dir, reference, check) = setup();

        let report = find_duplicates(&reference, &check, false).unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 0);
        assert!(!check.join("renamed_copy.png").exists());
        assert!(!check.join("deep/another.bin").exists());
        assert!(check.join("unique.txt").exists());
        assert!(report.log.contains("matches 'original.jpg'"));
    }

    #[test]
    fn test_reference_tree_is_untouched() {
        let (_dir, reference, check) = setup();
        let before = snapshot(&reference);

        find_duplicates(&reference, &check, false).unwrap();

        assert_eq!(snapshot(&reference), before);
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let (_dir, reference, check) = setup();
        let before_check = snapshot(&check);
        let before_reference = snapshot(&reference);

        let report = find_duplicates(&reference, &check, true).unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.deleted, 0);
        assert!(report.log.contains("Duplicate found"));
        assert!(!report.log.contains("Deleted:"));
        assert_eq!(snapshot(&check), before_check);
        assert_eq!(snapshot(&reference), before_reference);
    }

    #[test]
    fn test_unique_content_never_reported() {
        let (_dir, reference, check) = setup();
        let report = find_duplicates(&reference, &check, true).unwrap();
        assert!(!report.log.contains("unique.txt"));
    }

    #[test]
    fn test_index_keeps_first_seen_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"dup").unwrap();
        fs::write(dir.path().join("b.txt"), b"dup").unwrap();

        let mut log = OperationLog::new();
        let index = DuplicateIndex::build(dir.path(), &mut log);

        assert_eq!(index.len(), 1);
        assert!(log.is_empty());
        assert_eq!(
            index.lookup(&ContentDigest::of_bytes(b"dup")),
            Some(Path::new("a.txt"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_check_file_is_counted_and_scan_continues() {
        let (_dir, reference, check) = setup();
        std::os::unix::fs::symlink(check.join("gone.bin"), check.join("dangling.bin")).unwrap();

        let report = find_duplicates(&reference, &check, false).unwrap();

        assert_eq!(report.failed, 1);
        assert!(report.log.contains("Error checking file"));
        assert_eq!(report.found, 2);
        assert_eq!(report.deleted, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_deletion_is_counted_and_scan_continues() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, reference, check) = setup();
        let locked = check.join("deep");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory permissions
        if fs::write(locked.join("write_check"), b"").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = find_duplicates(&reference, &check, false).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
        assert!(report.log.contains("Error deleting"));
        assert!(locked.join("another.bin").exists());
        assert!(!check.join("renamed_copy.png").exists());
    }

    #[test]
    fn test_missing_directory_is_precondition_error() {
        let (dir, reference, _check) = setup();
        let err = find_duplicates(&reference, &dir.path().join("absent"), true).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { .. }));
    }
}
