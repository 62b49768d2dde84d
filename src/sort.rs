//! Gather files of one extension into a dedicated subfolder
//!
//! `photos/a.jpg` and `photos/trip/b.jpg` both end up in
//! `photos/jpg_files/`; name clashes get a numbered suffix. The destination
//! folder is never scanned, so sorting twice moves nothing the second time.

use crate::error::{Error, Result};
use crate::naming::resolve_unique_name;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::report::OperationResult;
use crate::walk::{Extension, FileEntry, walk};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// Move every file with `extension` under `source_dir` into its subfolder
pub fn sort_by_extension(
    source_dir: &Path,
    extension: &Extension,
    progress: &dyn ProgressSink,
) -> Result<OperationResult> {
    let _span = span!(Level::INFO, "sort", ?source_dir, %extension).entered();

    if !source_dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: source_dir.to_path_buf(),
        });
    }

    let destination = source_dir.join(extension.folder_name());
    let mut result = OperationResult::new();

    if !destination.is_dir() {
        fs::create_dir_all(&destination)?;
        result
            .log
            .push(format!("Created folder '{}'", destination.display()));
    }

    let mut matches: Vec<FileEntry> = Vec::new();
    for item in walk(source_dir).excluding(&destination) {
        match item {
            Ok(entry) if entry.extension == *extension => matches.push(entry),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                result.log.push(format!("Skipped unreadable entry: {}", e));
            }
        }
    }

    let total = matches.len();
    info!(total, "Found files to sort");

    for (index, entry) in matches.iter().enumerate() {
        let file_name = entry.file_name();
        progress.notify(&ProgressEvent::new(index + 1, total, file_name.as_str()));

        match relocate(entry, &destination) {
            Ok(dest_path) => {
                debug!(source = ?entry.absolute_path, destination = ?dest_path, "Moved file");
                result.succeeded += 1;
                result.log.push(format!(
                    "Moved '{}' -> '{}'",
                    entry.relative_path.display(),
                    dest_path.display()
                ));
            }
            Err(e) => {
                error!(source = ?entry.absolute_path, error = %e, "Failed to move file");
                result.failed += 1;
                result
                    .log
                    .push(format!("Error moving '{}': {}", file_name, e));
            }
        }
    }

    info!("{}", result.summary());
    Ok(result)
}

/// Move one entry into `destination` under a collision-free name
fn relocate(entry: &FileEntry, destination: &Path) -> Result<PathBuf> {
    let name = entry.absolute_path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let unique = resolve_unique_name(destination, name)?;
    let dest_path = destination.join(unique);
    move_file(&entry.absolute_path, &dest_path)?;
    Ok(dest_path)
}

/// Rename, falling back to copy + delete across filesystems
fn move_file(source: &Path, dest: &Path) -> Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    if let Err(e) = copy_file(source, dest) {
        // Drop the partial copy
        let _ = fs::remove_file(dest);
        return Err(e);
    }

    // Preserve modification time
    if let Ok(metadata) = fs::metadata(source)
        && let Ok(mtime) = metadata.modified()
    {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
    }

    if let Err(e) = fs::remove_file(source) {
        // Leave the source in place rather than keeping two copies
        let _ = fs::remove_file(dest);
        return Err(e.into());
    }
    Ok(())
}

/// Copy file with buffered I/O for efficiency
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
