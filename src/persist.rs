//! Crash-safe replacement of files on disk.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full content lands or the file is left as it was. The
/// replacement keeps the original file's permissions and gets a fresh mtime
/// so the build tool notices the change.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    // Same directory keeps the rename on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let permissions = fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}
