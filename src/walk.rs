//! Recursive directory indexing
//!
//! [`walk`] yields every file under a root as a [`FileEntry`], depth-first,
//! with directory entries visited in file-name order so repeated runs see
//! the same sequence. Unreadable entries come out as `Err` items; the walk
//! carries on past them.

use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Literal text of the sentinel extension
pub const NO_EXTENSION: &str = "no_extension";

/// Normalized file extension: lowercase, without the dot
///
/// Ordering and equality follow the literal text, so the sentinel sorts as
/// `"no_extension"` among the named extensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Extension {
    Named(String),
    None,
}

impl Extension {
    /// Classify a file name
    ///
    /// Uses the platform extension rule: `"a.TXT"` is `txt`, while
    /// `"readme"`, `".bashrc"` and `"notes."` have no extension.
    pub fn from_file_name(name: &OsStr) -> Self {
        match Path::new(name).extension() {
            Some(ext) if !ext.is_empty() => Self::from_normalized(ext.to_string_lossy().to_lowercase()),
            _ => Self::None,
        }
    }

    /// Parse user input such as `"JPG"`, `".jpg"` or `"no_extension"`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_start_matches('.');
        if trimmed.is_empty() || trimmed.contains(['/', '\\', '.']) {
            return Err(crate::Error::InvalidExtension(input.to_string()));
        }
        Ok(Self::from_normalized(trimmed.to_lowercase()))
    }

    fn from_normalized(ext: String) -> Self {
        // A literal ".no_extension" suffix is indistinguishable from the sentinel
        if ext == NO_EXTENSION {
            Self::None
        } else {
            Self::Named(ext)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(ext) => ext,
            Self::None => NO_EXTENSION,
        }
    }

    /// Name of the folder the sorter gathers this extension into
    pub fn folder_name(&self) -> String {
        match self {
            Self::Named(ext) => format!("{}_files", ext),
            Self::None => NO_EXTENSION.to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Ord for Extension {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Extension {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Extension> for String {
    fn from(ext: Extension) -> Self {
        ext.as_str().to_string()
    }
}

/// A file discovered under a walk root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path as reached from the walk root
    pub absolute_path: PathBuf,
    /// Path relative to the walk root
    pub relative_path: PathBuf,
    pub extension: Extension,
    pub size_bytes: u64,
}

impl FileEntry {
    /// File name for display
    pub fn file_name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lazy depth-first file iterator
pub struct Walk {
    root: PathBuf,
    inner: walkdir::IntoIter,
    excluded: Option<PathBuf>,
}

/// Walk every file under `root`
pub fn walk(root: &Path) -> Walk {
    Walk {
        root: root.to_path_buf(),
        inner: WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter(),
        excluded: None,
    }
}

impl Walk {
    /// Skip `dir` and everything beneath it
    pub fn excluding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded = Some(dir.into());
        self
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.as_deref() == Some(path)
    }
}

impl Iterator for Walk {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if self.is_excluded(entry.path()) {
                    trace!(path = ?entry.path(), "Skipping excluded directory");
                    self.inner.skip_current_dir();
                }
                continue;
            }

            // Links to directories are neither followed nor reported as files
            if file_type.is_symlink() && entry.path().is_dir() {
                continue;
            }

            let size_bytes = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => return Some(Err(e.into())),
            };

            let absolute_path = entry.path().to_path_buf();
            let relative_path = absolute_path
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| absolute_path.clone());

            return Some(Ok(FileEntry {
                extension: Extension::from_file_name(entry.file_name()),
                absolute_path,
                relative_path,
                size_bytes,
            }));
        }
    }
}
