//! Atomic file writes, so a crash never leaves a torn history entry.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use uptodate_core::{Error, Result};
use uuid::Uuid;

/// Writes `content` to `path` by writing a temporary file in the same
/// directory and renaming it into place.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration("invalid store path: no parent directory".to_string())
    })?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    // Same directory as the target, so the rename cannot cross devices.
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .map_err(|e| Error::file_system(&temp_path, "write temporary file", e))?;

        file.sync_all()
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system(path, "atomically rename", e)
    })?;

    Ok(())
}
