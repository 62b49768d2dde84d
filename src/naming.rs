//! Collision-free destination names

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Upper bound on numbered attempts before giving up
const MAX_SUFFIX: u32 = 100_000;

/// Choose a name for `candidate` that does not exist in `dir`
///
/// Returns `candidate` unchanged when it is free, otherwise the first free
/// `stem(N).ext` for N = 1, 2, ... Every attempt hits the filesystem. Names
/// are handled as raw OS strings, so bytes that are not valid UTF-8 survive.
pub fn resolve_unique_name(dir: &Path, candidate: &OsStr) -> Result<OsString> {
    if !occupied(&dir.join(candidate)) {
        return Ok(candidate.to_os_string());
    }

    let (stem, extension) = split_name(candidate);
    for counter in 1..=MAX_SUFFIX {
        let mut name = stem.to_os_string();
        name.push(format!("({})", counter));
        if let Some(extension) = extension {
            name.push(".");
            name.push(extension);
        }

        if !occupied(&dir.join(&name)) {
            debug!(?dir, ?candidate, resolved = ?name, "Resolved name collision");
            return Ok(name);
        }
    }

    Err(Error::NameExhausted {
        dir: dir.to_path_buf(),
        name: candidate.to_string_lossy().into_owned(),
    })
}

/// Dangling symlinks still occupy their name
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Split into stem and extension (without the dot), following the platform rule
fn split_name(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), extension) => (stem, extension),
        (None, _) => (name, None),
    }
}
