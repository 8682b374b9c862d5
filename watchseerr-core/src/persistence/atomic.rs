use std::{io::Write, path::Path};

use tempfile::NamedTempFile;

use super::PersistenceError;

/// Writes through a temp file in the target's directory and renames it over
/// the target, so readers never observe a partial file.
pub(super) fn write_atomically<F>(
    path: &Path,
    fill: F,
) -> Result<(), PersistenceError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), PersistenceError>,
{
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    fill(&mut tmp)?;
    tmp.flush().map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
