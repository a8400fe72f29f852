use std::fs;
use std::io;
use std::path::Path;

/// Recursively remove `dir`. Returns `Ok(false)` when there was nothing to
/// remove.
pub fn delete_directory(dir: &Path) -> io::Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    fs::remove_dir_all(dir)?;
    Ok(true)
}
