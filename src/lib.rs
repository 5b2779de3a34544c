use serde::{Deserialize, Serialize};

pub mod api;
pub mod busy;
pub mod error;
pub mod format;
pub mod preview;
pub mod registry;
pub mod upload;

#[cfg(test)]
mod testing;

pub use api::{Endpoints, FileApi, FileContent};
pub use error::{FileError, Result, ValidationError};
pub use preview::{Preview, PreviewKind, PreviewResolver};
pub use registry::FileRegistry;
pub use upload::{UploadController, UploadOutcome, UploadSelection};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Metadata for one stored file, as issued by the file server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_type: String,
    pub size: u64,
    pub storage_path: String,
    /// Epoch milliseconds.
    pub upload_time: i64,
}

impl FileRecord {
    pub fn kind(&self) -> PreviewKind {
        PreviewKind::from_content_type(&self.file_type)
    }
}

/// Runtime configuration handed to the browser by the host binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    pub api_base: String,
    pub debug_mode: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            debug_mode: false,
        }
    }
}

#[cfg(feature = "frontend")]
pub mod http;

#[cfg(feature = "frontend")]
pub mod logger;

#[cfg(feature = "frontend")]
pub mod transient;

#[cfg(feature = "frontend")]
pub mod frontend;

#[cfg(feature = "frontend")]
pub use frontend::*;
