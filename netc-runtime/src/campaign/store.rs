//! Durable storage of campaign results.
//!
//! Each record is written to its own file as soon as it exists; the report is written once at the
//! end. Files are written under a temporary name and renamed into place, so a crash never leaves a
//! truncated record behind.
use netc_core::{Report, TestRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, trace};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unable to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub async fn create(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn record_path(&self, record: &TestRecord) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}_{}.json",
            record.timestamp, record.test_type, record.test_server, record.target_server
        ))
    }

    pub fn report_path(&self, report: &Report) -> PathBuf {
        self.dir
            .join(format!("{}_test_results.json", report.start_timestamp))
    }

    pub async fn write_record(&self, record: &TestRecord) -> Result<PathBuf, StoreError> {
        let path = self.record_path(record);
        write_json(&path, record).await?;
        debug!("Saved {}.", path.display());
        Ok(path)
    }

    /// The report file holds the records as a JSON array.
    pub async fn write_report(&self, report: &Report) -> Result<PathBuf, StoreError> {
        let path = self.report_path(report);
        write_json(&path, &report.records).await?;
        Ok(path)
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let contents = serde_json::to_vec_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, contents).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
