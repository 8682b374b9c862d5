use std::{
    fs,
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
};

use tracing::debug;
use watchseerr_model::EnrichedFilm;

use super::{PersistenceError, atomic::write_atomically};

/// JSON snapshot of the ledger carried between runs.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previous snapshot; a missing file is an empty ledger.
    pub fn load(&self) -> Result<Vec<EnrichedFilm>, PersistenceError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no ledger snapshot yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            PersistenceError::Json {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn save(&self, films: &[EnrichedFilm]) -> Result<(), PersistenceError> {
        write_atomically(&self.path, |tmp| {
            serde_json::to_writer_pretty(tmp, films).map_err(|source| {
                PersistenceError::Json {
                    path: self.path.clone(),
                    source,
                }
            })
        })?;
        debug!(
            path = %self.path.display(),
            films = films.len(),
            "ledger snapshot written"
        );
        Ok(())
    }
}
