//! File-backed store.
//!
//! Appends one line of line protocol per point. The output can be
//! loaded into InfluxDB later with `influx write --file`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use geowatch_types::Point;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::ObservationStore;
use crate::error::StoreError;

/// A store that appends points to a local file.
#[derive(Debug)]
pub struct LineProtocolFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl LineProtocolFile {
    /// Open `path` for appending, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ObservationStore for LineProtocolFile {
    async fn write_point(&self, point: &Point) -> Result<(), StoreError> {
        if !point.has_fields() {
            return Err(StoreError::Rejected(format!(
                "point for measurement '{}' has no fields",
                point.measurement
            )));
        }

        let mut line = point.to_line_protocol();
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("file: {}", self.path.display())
    }
}
