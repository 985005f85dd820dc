//! Per-record JSON storage: one `<id>.json` file per submission.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    error::{StoreError, StoreResult},
    log_error, log_info, log_warn,
    models::{is_safe_identifier, HealthRecord},
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "health_intake::records";

const RECORD_EXTENSION: &str = "json";

pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    ///
    /// A creation failure is only logged here; it resurfaces as a
    /// [`StoreError::Storage`] on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let store = Self { dir: dir.into() };
        if let Err(err) = store.ensure_storage_ready() {
            log_error!("Failed to create data directory: {err:#}");
        }
        store
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Idempotently creates the backing directory.
    pub fn ensure_storage_ready(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create data directory {}", self.dir.display())
        })?;
        Ok(())
    }

    /// Writes the record under its identifier, replacing any earlier copy.
    pub fn save(&self, record: &HealthRecord) -> StoreResult<()> {
        let path = self.path_for(&record.id)?;
        self.ensure_storage_ready()?;

        let serialized = serde_json::to_string_pretty(record)
            .with_context(|| format!("failed to serialize record {}", record.id))?;
        fs::write(&path, serialized)
            .with_context(|| format!("failed to write record to {}", path.display()))?;

        log_info!("Saved record {} to {}", record.id, path.display());
        Ok(())
    }

    pub fn read(&self, id: &str) -> StoreResult<HealthRecord> {
        let path = self.path_for(id)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(format!("record {id}")));
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to read record from {}", path.display()))
                    .into());
            }
        };

        let record = serde_json::from_str(&contents)
            .with_context(|| format!("malformed record in {}", path.display()))?;
        Ok(record)
    }

    /// Returns every stored record in directory order. A missing directory
    /// means nothing has been saved yet and yields an empty list.
    pub fn list_all(&self) -> StoreResult<Vec<HealthRecord>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to list {}", self.dir.display()))
                    .into());
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("failed to list {}", self.dir.display()))?;
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }

            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read record from {}", path.display()))?;
            let record: HealthRecord = serde_json::from_str(&contents)
                .with_context(|| format!("malformed record in {}", path.display()))?;
            records.push(record);
        }

        Ok(records)
    }

    fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        if !is_safe_identifier(id) {
            log_warn!("Refusing record identifier {id:?}");
            return Err(StoreError::InvalidIdentifier(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.{RECORD_EXTENSION}")))
    }
}

fn is_record_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|extension| extension == RECORD_EXTENSION)
}
