use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;
use watchseerr_model::{OutcomeRecord, OutcomeRow, OutcomeValue};

use super::{PersistenceError, atomic::write_atomically};

pub const OUTCOME_HEADER: [&str; 4] = ["catalogId", "title", "status", "detail"];

/// CSV log of the last run's per-film outcomes, replaced every run.
#[derive(Debug, Clone)]
pub struct OutcomeLog {
    path: PathBuf,
}

impl OutcomeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn csv_err(&self, source: csv::Error) -> PersistenceError {
        PersistenceError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    pub fn write(
        &self,
        records: &[OutcomeRecord],
    ) -> Result<(), PersistenceError> {
        write_atomically(&self.path, |tmp| {
            let mut writer = csv::Writer::from_writer(tmp);
            writer
                .write_record(OUTCOME_HEADER)
                .map_err(|e| self.csv_err(e))?;
            for record in records {
                let catalog_id = record
                    .catalog_id
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                writer
                    .write_record([
                        catalog_id.as_str(),
                        record.title.as_str(),
                        record.status.as_str(),
                        record.detail.as_str(),
                    ])
                    .map_err(|e| self.csv_err(e))?;
            }
            writer.flush().map_err(|source| PersistenceError::Io {
                path: self.path.clone(),
                source,
            })
        })?;
        debug!(
            path = %self.path.display(),
            rows = records.len(),
            "outcome log written"
        );
        Ok(())
    }

    /// Rows keyed by header; integer-looking fields become integers. A
    /// missing log reads as no rows.
    pub fn read(&self) -> Result<Vec<OutcomeRow>, PersistenceError> {
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(err) if is_not_found(&err) => return Ok(Vec::new()),
            Err(err) => return Err(self.csv_err(err)),
        };

        let headers = reader.headers().map_err(|e| self.csv_err(e))?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.csv_err(e))?;
            let row: OutcomeRow = headers
                .iter()
                .zip(record.iter())
                .map(|(key, value)| (key.to_string(), OutcomeValue::coerce(value)))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use watchseerr_model::{CatalogId, RequestStatus};

    #[test]
    fn rows_read_back_with_integer_coercion() {
        let dir = tempdir().expect("tempdir");
        let log = OutcomeLog::new(dir.path().join("last_requests.csv"));
        log.write(&[
            OutcomeRecord {
                catalog_id: Some(CatalogId(603)),
                title: "The Matrix".into(),
                status: RequestStatus::Created,
                detail: String::new(),
            },
            OutcomeRecord {
                catalog_id: None,
                title: "unknown, film".into(),
                status: RequestStatus::MissingMetadata,
                detail: "no catalog id".into(),
            },
        ])
        .expect("write");

        let raw = std::fs::read_to_string(log.path()).expect("read raw");
        assert!(raw.starts_with("catalogId,title,status,detail\n"));

        let rows = log.read().expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["catalogId"], OutcomeValue::Integer(603));
        assert_eq!(rows[0]["status"], OutcomeValue::Text("CREATED".into()));
        assert_eq!(rows[1]["catalogId"], OutcomeValue::Text(String::new()));
        assert_eq!(rows[1]["title"], OutcomeValue::Text("unknown, film".into()));
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempdir().expect("tempdir");
        let log = OutcomeLog::new(dir.path().join("absent.csv"));
        assert!(log.read().expect("read").is_empty());
    }

    #[test]
    fn write_overwrites_previous_run() {
        let dir = tempdir().expect("tempdir");
        let log = OutcomeLog::new(dir.path().join("last_requests.csv"));
        let record = |id| OutcomeRecord {
            catalog_id: Some(CatalogId(id)),
            title: format!("film {id}"),
            status: RequestStatus::QuotaReached,
            detail: String::new(),
        };

        log.write(&[record(1), record(2)]).expect("first");
        log.write(&[record(3)]).expect("second");

        let rows = log.read().expect("read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["catalogId"], OutcomeValue::Integer(3));
    }
}
