use crate::{FileRecord, Result};

pub const FILES_PATH: &str = "/files";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Raw bytes of a stored file together with the `Content-Type` the server declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// The remote file API. Every call is one request; nothing is cached between calls.
///
/// Implementations map a 404 to [`crate::FileError::NotFound`] and every other
/// failure to [`crate::FileError::Transport`].
#[allow(async_fn_in_trait)]
pub trait FileApi {
    /// Current file set, in whatever order the server returns it.
    async fn list(&self) -> Result<Vec<FileRecord>>;

    /// Sends `bytes` as the `file` form field. The returned record's `filename`
    /// may differ from `name` when the server renamed on collision.
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<FileRecord>;

    async fn download(&self, filename: &str) -> Result<FileContent>;

    async fn delete(&self, filename: &str) -> Result<()>;

    async fn preview(&self, filename: &str) -> Result<FileContent>;
}

impl<A: FileApi> FileApi for &A {
    async fn list(&self) -> Result<Vec<FileRecord>> {
        (**self).list().await
    }

    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<FileRecord> {
        (**self).upload(bytes, name).await
    }

    async fn download(&self, filename: &str) -> Result<FileContent> {
        (**self).download(filename).await
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        (**self).delete(filename).await
    }

    async fn preview(&self, filename: &str) -> Result<FileContent> {
        (**self).preview(filename).await
    }
}

/// URL builder for the `/files` endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(api_base: &str) -> Self {
        Self {
            base: format!("{}{}", api_base.trim().trim_end_matches('/'), FILES_PATH),
        }
    }

    pub fn list(&self) -> String {
        self.base.clone()
    }

    pub fn upload(&self) -> String {
        format!("{}/upload", self.base)
    }

    /// Download and delete share this URL.
    pub fn file(&self, filename: &str) -> String {
        format!("{}/{}", self.base, urlencoding::encode(filename))
    }

    pub fn preview(&self, filename: &str) -> String {
        format!("{}/preview/{}", self.base, urlencoding::encode(filename))
    }
}

/// Client route for previewing `filename`. The router percent-decodes the
/// segment once, so the page must take the parameter as-is.
pub fn preview_route(filename: &str) -> String {
    format!("/preview/{}", urlencoding::encode(filename))
}
