//! Extension inventory of a directory tree

use crate::error::{Error, Result};
use crate::walk::{Extension, walk};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Distinct extensions under `root`, sorted by their literal text
pub fn scan_extensions(root: &Path) -> Result<Vec<Extension>> {
    Ok(count_extensions(root)?.into_keys().collect())
}

/// Number of files per extension under `root`
pub fn count_extensions(root: &Path) -> Result<BTreeMap<Extension, usize>> {
    if !root.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut counts = BTreeMap::new();
    for item in walk(root) {
        match item {
            Ok(entry) => *counts.entry(entry.extension).or_insert(0) += 1,
            Err(e) => warn!(?root, error = %e, "Skipping unreadable entry during extension scan"),
        }
    }

    debug!(?root, distinct = counts.len(), "Scanned extensions");
    Ok(counts)
}
