use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removes `path` if it exists. A missing file is not an error.
pub fn clear(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed previous output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Sibling path an export writes to before it is moved into place.
///
/// Keeps the original extension last (`movie.mov` → `movie.partial.mov`)
/// so the container is still inferred from it.
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Moves a finished partial file over the destination.
pub fn commit(partial: &Path, destination: &Path) -> io::Result<()> {
    fs::rename(partial, destination)
}

/// Deletes a partial file after a failed export, logging instead of failing.
pub fn discard(partial: &Path) {
    if let Err(e) = clear(partial) {
        log::warn!("Failed to remove partial output {}: {e}", partial.display());
    }
}

/// Creates the parent directory of `path` when it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
