use thiserror::Error;

use crate::upload::SUPPORTED_EXTENSIONS;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    /// Connection failure, unreadable body, or any non-2xx status other than 404.
    #[error(
        "transport error{}: {message}",
        .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
    )]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("preview not supported for content type {0}")]
    UnsupportedPreview(String),
    #[error("could not decode content: {0}")]
    Decode(String),
    /// The locally selected file could not be read into memory.
    #[error("could not read {name}: {message}")]
    Read { name: String, message: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} already in progress")]
    Busy(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file name given")]
    EmptyName,
    #[error("file has no extension")]
    MissingExtension,
    #[error("unsupported file type .{extension}")]
    UnsupportedExtension { extension: String },
    #[error("no upload is waiting for confirmation")]
    NothingToConfirm,
}

impl FileError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn read(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Read {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Text shown to the user by the views.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => {
                "Could not reach the file server. Please try again.".to_string()
            }
            Self::NotFound(name) => format!("\"{name}\" no longer exists on the server."),
            Self::UnsupportedPreview(_) => {
                "This file type cannot be previewed. Please download the file to view its contents."
                    .to_string()
            }
            Self::Decode(_) => "The file content could not be displayed as text.".to_string(),
            Self::Read { name, .. } => {
                format!("\"{name}\" could not be read. Please select it again.")
            }
            Self::Validation(ValidationError::EmptyName) => "Please select a file.".to_string(),
            Self::Validation(ValidationError::NothingToConfirm) => {
                "There is no upload waiting for confirmation.".to_string()
            }
            Self::Validation(_) => format!(
                "File type not supported. Supported types: {}",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
            Self::Busy(what) => format!("Please wait, {what} is still running."),
        }
    }
}
