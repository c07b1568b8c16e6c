use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::Path;

pub fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).map_err(|e| anyhow!("Opening {} file `{}`: {}", kind, path.display(), e))
}

/// Writes `contents` to `path`, creating any missing parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Removes `dir` and everything below it. A missing directory is not an
/// error.
pub fn rmdir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
