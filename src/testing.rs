//! In-memory stand-in for the remote file server, used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::upload::content_type_for;
use crate::{FileApi, FileContent, FileError, FileRecord, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Upload,
    Download,
    Delete,
    Preview,
}

#[derive(Default)]
pub struct FakeApi {
    files: RefCell<Vec<(FileRecord, FileContent)>>,
    next_id: Cell<i64>,
    calls: RefCell<HashMap<Op, usize>>,
    failures: RefCell<HashMap<Op, FileError>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            ..Self::default()
        }
    }

    pub fn with_file(self, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.store(filename, filename, content_type, bytes.to_vec());
        self
    }

    /// Every later call of `op` fails with `err`.
    pub fn fail(&self, op: Op, err: FileError) {
        self.failures.borrow_mut().insert(op, err);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.borrow().get(&op).copied().unwrap_or(0)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.files
            .borrow()
            .iter()
            .map(|(record, _)| record.filename.clone())
            .collect()
    }

    fn enter(&self, op: Op) -> Result<()> {
        *self.calls.borrow_mut().entry(op).or_insert(0) += 1;
        match self.failures.borrow().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn store(
        &self,
        filename: &str,
        original: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> FileRecord {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let record = FileRecord {
            id,
            filename: filename.to_string(),
            original_filename: original.to_string(),
            file_type: content_type.to_string(),
            size: bytes.len() as u64,
            storage_path: format!("/uploads/{filename}"),
            upload_time: 1_700_000_000_000 + id,
        };
        self.files.borrow_mut().push((
            record.clone(),
            FileContent {
                bytes,
                content_type: content_type.to_string(),
            },
        ));
        record
    }

    fn unique_name(&self, name: &str) -> String {
        let taken = |candidate: &str| {
            self.files
                .borrow()
                .iter()
                .any(|(r, _)| r.filename == candidate)
        };
        if !taken(name) {
            return name.to_string();
        }
        let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
        (1..)
            .map(|n| format!("{stem}({n}).{ext}"))
            .find(|candidate| !taken(candidate))
            .unwrap()
    }

    fn content(&self, filename: &str) -> Result<FileContent> {
        self.files
            .borrow()
            .iter()
            .find(|(record, _)| record.filename == filename)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| FileError::NotFound(filename.to_string()))
    }
}

impl FileApi for FakeApi {
    async fn list(&self) -> Result<Vec<FileRecord>> {
        self.enter(Op::List)?;
        Ok(self.files.borrow().iter().map(|(r, _)| r.clone()).collect())
    }

    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<FileRecord> {
        self.enter(Op::Upload)?;
        let filename = self.unique_name(name);
        Ok(self.store(&filename, name, content_type_for(name), bytes))
    }

    async fn download(&self, filename: &str) -> Result<FileContent> {
        self.enter(Op::Download)?;
        self.content(filename)
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        self.enter(Op::Delete)?;
        let mut files = self.files.borrow_mut();
        let before = files.len();
        files.retain(|(record, _)| record.filename != filename);
        if files.len() == before {
            return Err(FileError::NotFound(filename.to_string()));
        }
        Ok(())
    }

    async fn preview(&self, filename: &str) -> Result<FileContent> {
        self.enter(Op::Preview)?;
        self.content(filename)
    }
}
