use crate::records::history;
use crate::records::types::{Observation, RecordRow};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record log is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Remote backend could not be reached or answered with an error.
    #[error("remote record store unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
}

/// Append-only log of observations.
///
/// `read_all` returns the full history ordered by timestamp, ties in
/// insertion order. There is no update or delete.
pub trait RecordStore {
    fn read_all(&self) -> Result<Vec<Observation>, StoreError>;
    fn append(&self, observation: &Observation) -> Result<(), StoreError>;
}

fn into_history(rows: &[RecordRow]) -> Vec<Observation> {
    let mut observations: Vec<Observation> = rows.iter().map(Observation::from_row).collect();
    history::sort_chronological(&mut observations);
    observations
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub worksheet: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            worksheet: "Sheet1".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Which backend to use. The local file is always configured since it is
/// the fallback for the remote one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub local_path: PathBuf,
    pub remote: Option<RemoteConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from("ovulation_data.json"),
            remote: None,
        }
    }
}

/// Local flat-file backend: a JSON array of rows.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_rows(&self) -> Result<Vec<RecordRow>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Tmp + rename, so a failed write leaves the previous log intact.
    fn write_rows(&self, rows: &[RecordRow]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(rows)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("records");
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        if let Err(e) = write_synced(&tmp_path, json.as_bytes()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl RecordStore for FileRecordStore {
    fn read_all(&self) -> Result<Vec<Observation>, StoreError> {
        let rows = self.load_rows()?;
        debug!(path = %self.path.display(), rows = rows.len(), "Loaded local records");
        Ok(into_history(&rows))
    }

    fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        let mut rows = self.load_rows()?;
        rows.push(observation.to_row());
        self.write_rows(&rows)?;
        info!(
            path = %self.path.display(),
            kind = %observation.kind,
            value = observation.value,
            "Appended record"
        );
        Ok(())
    }
}

/// Remote spreadsheet-like backend. The worksheet is read as a JSON array of
/// rows and replaced wholesale on append.
#[derive(Debug, Clone)]
pub struct SheetRecordStore {
    client: reqwest::blocking::Client,
    url: String,
}

impl SheetRecordStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/worksheets/{}",
                config.base_url.trim_end_matches('/'),
                config.worksheet
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn fetch_rows(&self) -> Result<Vec<RecordRow>, StoreError> {
        let rows = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json::<Vec<RecordRow>>()?;
        Ok(rows)
    }

    fn put_rows(&self, rows: &[RecordRow]) -> Result<(), StoreError> {
        self.client
            .put(&self.url)
            .json(rows)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

impl RecordStore for SheetRecordStore {
    fn read_all(&self) -> Result<Vec<Observation>, StoreError> {
        let rows = self.fetch_rows()?;
        debug!(url = %self.url, rows = rows.len(), "Loaded remote records");
        Ok(into_history(&rows))
    }

    fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        self.append_rows(vec![observation.to_row()])?;
        info!(url = %self.url, kind = %observation.kind, "Appended remote record");
        Ok(())
    }
}

impl SheetRecordStore {
    fn append_rows(&self, new_rows: Vec<RecordRow>) -> Result<(), StoreError> {
        let mut rows = self.fetch_rows()?;
        rows.extend(new_rows);
        self.put_rows(&rows)
    }
}

/// Rows that could only be written locally while the remote was down,
/// kept beside the local log until a remote append carries them over.
fn pending_path(local_path: &Path) -> PathBuf {
    local_path.with_extension("pending.json")
}

/// The configured record log.
///
/// `Synced` prefers the remote worksheet and falls back to the local file
/// whenever a call finds the remote unavailable. The decision is made on
/// every call, so the remote is used again as soon as it recovers.
///
/// A fallback append also lands in `pending`. Remote reads include the
/// pending rows, and the next successful remote append flushes them, so
/// an acknowledged append is never missing from a later read.
#[derive(Debug, Clone)]
pub enum RecordLog {
    Local(FileRecordStore),
    Synced {
        remote: SheetRecordStore,
        local: FileRecordStore,
        pending: FileRecordStore,
    },
}

impl RecordLog {
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let local = FileRecordStore::new(&config.local_path);
        match &config.remote {
            Some(remote) => {
                let remote = SheetRecordStore::new(remote)?;
                let pending = FileRecordStore::new(pending_path(&config.local_path));
                info!(url = %remote.url(), "Using remote record store with local fallback");
                Ok(RecordLog::Synced {
                    remote,
                    local,
                    pending,
                })
            }
            None => {
                info!(path = %local.path().display(), "Using local record store");
                Ok(RecordLog::Local(local))
            }
        }
    }

    /// Rows awaiting a remote append. Always empty for `Local`.
    pub fn pending(&self) -> Result<Vec<Observation>, StoreError> {
        match self {
            RecordLog::Local(_) => Ok(Vec::new()),
            RecordLog::Synced { pending, .. } => pending.read_all(),
        }
    }
}

impl RecordStore for RecordLog {
    fn read_all(&self) -> Result<Vec<Observation>, StoreError> {
        match self {
            RecordLog::Local(local) => local.read_all(),
            RecordLog::Synced {
                remote,
                local,
                pending,
            } => match remote.fetch_rows() {
                Ok(mut rows) => {
                    let queued = pending.load_rows()?;
                    debug!(rows = rows.len(), pending = queued.len(), "Loaded remote records");
                    rows.extend(queued);
                    Ok(into_history(&rows))
                }
                Err(StoreError::Unavailable(e)) => {
                    warn!(error = %e, "Remote read failed, falling back to local records");
                    local.read_all()
                }
                Err(e) => Err(e),
            },
        }
    }

    fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        match self {
            RecordLog::Local(local) => local.append(observation),
            RecordLog::Synced {
                remote,
                local,
                pending,
            } => {
                let queued = pending.load_rows()?;
                let flushed = queued.len();
                let mut batch = queued;
                batch.push(observation.to_row());

                match remote.append_rows(batch) {
                    Ok(()) => {
                        if flushed > 0 {
                            pending.write_rows(&[])?;
                            info!(flushed, "Flushed pending records to remote");
                        }
                        info!(url = %remote.url(), kind = %observation.kind, "Appended remote record");
                        Ok(())
                    }
                    Err(StoreError::Unavailable(e)) => {
                        warn!(error = %e, "Remote append failed, writing to local records");
                        local.append(observation)?;
                        pending.append(observation)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}
