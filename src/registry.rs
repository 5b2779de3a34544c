use std::cell::RefCell;

use crate::api::{FileApi, FileContent};
use crate::busy::BusyFlag;
use crate::{FileError, FileRecord, Result};

/// Case-insensitive substring match on `filename`; a leading `#` matches the
/// content type instead (`#image`, `#pdf`).
pub fn filter_records(records: &[FileRecord], query: &str) -> Vec<FileRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.to_vec();
    }

    match query.strip_prefix('#') {
        Some(file_type) => records
            .iter()
            .filter(|record| record.file_type.to_lowercase().contains(file_type))
            .cloned()
            .collect(),
        None => records
            .iter()
            .filter(|record| record.filename.to_lowercase().contains(&query))
            .cloned()
            .collect(),
    }
}

/// The file set one view knows about, plus the actions it dispatches.
///
/// The snapshot is owned by this value and changes only through [`refresh`](Self::refresh)
/// and successful [`delete`](Self::delete) calls.
pub struct FileRegistry<A> {
    api: A,
    snapshot: RefCell<Vec<FileRecord>>,
    deleting: BusyFlag,
}

impl<A: FileApi> FileRegistry<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            snapshot: RefCell::new(Vec::new()),
            deleting: BusyFlag::new(),
        }
    }

    /// Replaces the snapshot with the server's current list. On failure the
    /// previous snapshot is kept.
    pub async fn refresh(&self) -> Result<Vec<FileRecord>> {
        let records = self.api.list().await.map_err(|err| {
            log::error!("listing files failed: {}", err);
            err
        })?;
        log::debug!("loaded {} files", records.len());
        self.snapshot.replace(records.clone());
        Ok(records)
    }

    pub fn records(&self) -> Vec<FileRecord> {
        self.snapshot.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    pub fn find(&self, filename: &str) -> Option<FileRecord> {
        self.snapshot
            .borrow()
            .iter()
            .find(|record| record.filename == filename)
            .cloned()
    }

    pub fn search(&self, query: &str) -> Vec<FileRecord> {
        filter_records(&self.snapshot.borrow(), query)
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_busy()
    }

    /// Deletes `filename` on the server, then drops it from the snapshot.
    ///
    /// A name missing from the snapshot is `NotFound` without a request; a
    /// failed request leaves the snapshot untouched.
    pub async fn delete(&self, filename: &str) -> Result<FileRecord> {
        let _guard = self.deleting.acquire("a delete")?;
        let record = self
            .find(filename)
            .ok_or_else(|| FileError::NotFound(filename.to_string()))?;

        if let Err(err) = self.api.delete(filename).await {
            log::error!("deleting {} failed: {}", filename, err);
            return Err(err);
        }

        self.snapshot
            .borrow_mut()
            .retain(|record| record.filename != filename);
        log::info!("deleted {}", filename);
        Ok(record)
    }

    pub async fn download(&self, filename: &str) -> Result<FileContent> {
        let content = self.api.download(filename).await?;
        log::debug!(
            "downloaded {} ({} bytes, {})",
            filename,
            content.bytes.len(),
            content.content_type
        );
        Ok(content)
    }
}
