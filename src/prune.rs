//! Bottom-up removal of empty directories
//!
//! Children are visited before their parents, so a parent emptied by the
//! removal of its children is removed in the same pass. The root itself is
//! always kept.

use crate::error::{Error, Result};
use crate::report::OperationResult;
use std::fs;
use std::path::Path;
use tracing::{Level, debug, info, span, warn};
use walkdir::WalkDir;

/// Remove every empty directory below `target_dir`
///
/// In dry-run mode empty directories are counted and logged against the
/// current tree, so parents that would only become empty are not counted.
pub fn prune_empty_dirs(target_dir: &Path, dry_run: bool) -> Result<OperationResult> {
    let _span = span!(Level::INFO, "prune_empty_dirs", ?target_dir, dry_run).entered();

    if !target_dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: target_dir.to_path_buf(),
        });
    }

    let mut result = OperationResult::new();
    result.log.push("Starting empty folder cleanup...");

    let walker = WalkDir::new(target_dir)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                result.failed += 1;
                result.log.push(format!("Error accessing folder: {}", e));
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        match is_empty_dir(path) {
            Ok(false) => {}
            Ok(true) if dry_run => {
                debug!(?path, "Found empty folder");
                result.succeeded += 1;
                result.log.push(format!(
                    "Found empty folder (will not delete in dry run): '{}'",
                    path.display()
                ));
            }
            Ok(true) => match fs::remove_dir(path) {
                Ok(()) => {
                    debug!(?path, "Deleted empty folder");
                    result.succeeded += 1;
                    result
                        .log
                        .push(format!("Deleted empty folder: '{}'", path.display()));
                }
                Err(e) => {
                    warn!(?path, error = %e, "Failed to delete folder");
                    result.failed += 1;
                    result.log.push(format!(
                        "Error deleting folder '{}': {}",
                        path.display(),
                        e
                    ));
                }
            },
            Err(e) => {
                warn!(?path, error = %e, "Failed to read folder");
                result.failed += 1;
                result.log.push(format!(
                    "Error accessing folder '{}': {}",
                    path.display(),
                    e
                ));
            }
        }
    }

    info!("{}", result.summary());
    Ok(result)
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_empty_parents_removed_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("A/B")).unwrap();

        let result = prune_empty_dirs(dir.path(), false).unwrap();

        assert_eq!(result.succeeded, 2);
        assert!(!dir.path().join("A").exists());
        assert!(dir.path().exists());
        // B is reported before A
        let b_pos = result.log.lines().iter().position(|l| l.ends_with("B'")).unwrap();
        let a_pos = result.log.lines().iter().position(|l| l.ends_with("A'")).unwrap();
        assert!(b_pos < a_pos);
    }

    #[test]
    fn test_directories_with_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("full/empty")).unwrap();
        fs::write(dir.path().join("full/keep.txt"), b"k").unwrap();

        let result = prune_empty_dirs(dir.path(), false).unwrap();

        assert_eq!(result.succeeded, 1);
        assert!(dir.path().join("full/keep.txt").exists());
        assert!(!dir.path().join("full/empty").exists());
    }

    #[test]
    fn test_root_is_never_removed() {
        let dir = tempfile::tempdir().unwrap();
        let result = prune_empty_dirs(dir.path(), false).unwrap();

        assert_eq!(result.succeeded, 0);
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_dry_run_counts_only_currently_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("A/B")).unwrap();

        let result = prune_empty_dirs(dir.path(), true).unwrap();

        assert_eq!(result.succeeded, 1);
        assert!(dir.path().join("A/B").is_dir());
        assert!(result.log.contains("will not delete in dry run"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_removal_is_counted_and_pass_continues() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory permissions
        if fs::write(locked.join("write_check"), b"").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = prune_empty_dirs(dir.path(), false).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded, 1);
        assert!(result.log.contains("Error deleting folder"));
        assert!(locked.join("inner").is_dir());
        assert!(!dir.path().join("other").exists());
    }

    #[test]
    fn test_missing_target_is_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = prune_empty_dirs(&dir.path().join("gone"), false).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { .. }));
    }
}
