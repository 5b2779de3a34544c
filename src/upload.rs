use std::cell::RefCell;

use crate::api::{FileApi, OCTET_STREAM};
use crate::busy::BusyFlag;
use crate::{FileRecord, Result, ValidationError};

pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["txt", "pdf", "jpg", "jpeg", "png", "json"];

/// Lowercased text after the last `.`, if there is any.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Pre-flight check on a proposed file name. Never touches the network.
pub fn validate_name(name: &str) -> std::result::Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let extension = extension_of(name).ok_or(ValidationError::MissingExtension)?;
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedExtension { extension });
    }
    Ok(extension)
}

/// MIME type sent with an upload of `name`.
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => OCTET_STREAM,
    }
}

/// Duplicates are judged by the name the client originally submitted, not the
/// (possibly renamed) stored name.
pub fn find_duplicate<'a>(records: &'a [FileRecord], name: &str) -> Option<&'a FileRecord> {
    records.iter().find(|record| record.original_filename == name)
}

/// A locally selected file, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSelection {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadSelection {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded(FileRecord),
    /// A file with the same original name exists; call [`UploadController::confirm`]
    /// or [`UploadController::cancel`].
    NeedsConfirmation { existing: FileRecord },
}

pub struct UploadController<A> {
    api: A,
    in_flight: BusyFlag,
    awaiting_confirmation: RefCell<Option<UploadSelection>>,
}

impl<A: FileApi> UploadController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            in_flight: BusyFlag::new(),
            awaiting_confirmation: RefCell::new(None),
        }
    }

    /// True while an upload request is pending; views disable selection meanwhile.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub fn awaiting_confirmation(&self) -> Option<String> {
        self.awaiting_confirmation
            .borrow()
            .as_ref()
            .map(|selection| selection.name.clone())
    }

    pub async fn submit(&self, selection: UploadSelection) -> Result<UploadOutcome> {
        let _guard = self.in_flight.acquire("an upload")?;
        self.awaiting_confirmation.replace(None);

        validate_name(&selection.name)?;

        let records = self.api.list().await?;
        if let Some(existing) = find_duplicate(&records, &selection.name) {
            log::info!(
                "{} already exists as {}, asking for confirmation",
                selection.name,
                existing.filename
            );
            let existing = existing.clone();
            self.awaiting_confirmation.replace(Some(selection));
            return Ok(UploadOutcome::NeedsConfirmation { existing });
        }

        self.send(selection).await.map(UploadOutcome::Uploaded)
    }

    /// Uploads the selection held back by a duplicate warning.
    pub async fn confirm(&self) -> Result<FileRecord> {
        let _guard = self.in_flight.acquire("an upload")?;
        let selection = self
            .awaiting_confirmation
            .take()
            .ok_or(ValidationError::NothingToConfirm)?;
        self.send(selection).await
    }

    /// Drops the held-back selection without sending anything.
    pub fn cancel(&self) -> Option<UploadSelection> {
        let selection = self.awaiting_confirmation.take();
        if let Some(selection) = &selection {
            log::debug!("upload of {} cancelled", selection.name);
        }
        selection
    }

    async fn send(&self, selection: UploadSelection) -> Result<FileRecord> {
        let UploadSelection { name, bytes } = selection;
        log::debug!("uploading {} ({} bytes)", name, bytes.len());
        match self.api.upload(bytes, &name).await {
            Ok(record) => {
                if record.filename != name {
                    log::info!("uploaded {} (stored as {})", name, record.filename);
                } else {
                    log::info!("uploaded {}", name);
                }
                Ok(record)
            }
            Err(err) => {
                log::error!("upload of {} failed: {}", name, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileError;
    use crate::testing::{FakeApi, Op};
    use futures::executor::block_on;

    #[test]
    fn supported_extensions_are_accepted_case_insensitively() {
        for name in ["a.txt", "b.PDF", "c.jpg", "d.Jpeg", "e.png", "f.json", "archive.tar.json"] {
            assert!(validate_name(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn other_or_missing_extensions_are_rejected() {
        assert_eq!(
            validate_name("setup.exe"),
            Err(ValidationError::UnsupportedExtension {
                extension: "exe".to_string()
            })
        );
        assert_eq!(validate_name("README"), Err(ValidationError::MissingExtension));
        assert_eq!(validate_name("trailing."), Err(ValidationError::MissingExtension));
        assert_eq!(validate_name("  "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn upload_content_type_follows_extension() {
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("data.json"), "application/json");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }

    #[test]
    fn duplicates_match_original_filename_only() {
        let api = FakeApi::new().with_file("a.txt", "text/plain", b"1");
        let records = block_on(api.list()).unwrap();
        let mut renamed = records[0].clone();
        renamed.filename = "b.txt".to_string();
        renamed.original_filename = "c.txt".to_string();
        let records = vec![records[0].clone(), renamed];

        assert!(find_duplicate(&records, "a.txt").is_some());
        assert!(find_duplicate(&records, "c.txt").is_some());
        assert!(find_duplicate(&records, "b.txt").is_none());
    }

    #[test]
    fn rejected_extension_makes_no_network_call() {
        let api = FakeApi::new();
        let controller = UploadController::new(&api);

        let selection = UploadSelection::new("tool.exe", vec![1]);
        let err = block_on(controller.submit(selection)).unwrap_err();

        assert!(matches!(err, FileError::Validation(_)));
        assert_eq!(api.calls(Op::List), 0);
        assert_eq!(api.calls(Op::Upload), 0);
        assert!(!controller.is_busy());
    }

    #[test]
    fn new_name_uploads_immediately() {
        let api = FakeApi::new();
        let controller = UploadController::new(&api);

        let selection = UploadSelection::new("notes.txt", b"hi".to_vec());
        let outcome = block_on(controller.submit(selection)).unwrap();

        let UploadOutcome::Uploaded(record) = outcome else {
            panic!("expected upload");
        };
        assert_eq!(record.filename, "notes.txt");
        assert_eq!(record.size, 2);
        assert_eq!(api.calls(Op::List), 1);
        assert_eq!(api.calls(Op::Upload), 1);
    }

    #[test]
    fn duplicate_waits_for_confirmation_and_decline_sends_nothing() {
        let api = FakeApi::new().with_file("a.txt", "text/plain", b"old");
        let controller = UploadController::new(&api);

        let selection = UploadSelection::new("a.txt", b"new".to_vec());
        let outcome = block_on(controller.submit(selection)).unwrap();
        assert!(matches!(
            outcome,
            UploadOutcome::NeedsConfirmation { ref existing } if existing.filename == "a.txt"
        ));
        assert_eq!(controller.awaiting_confirmation().as_deref(), Some("a.txt"));

        let dropped = controller.cancel().unwrap();
        assert_eq!(dropped.bytes, b"new");
        assert_eq!(controller.awaiting_confirmation(), None);
        assert_eq!(api.calls(Op::Upload), 0);
    }

    #[test]
    fn confirmed_duplicate_is_renamed_by_server() {
        let api = FakeApi::new().with_file("a.txt", "text/plain", b"old");
        let controller = UploadController::new(&api);

        block_on(controller.submit(UploadSelection::new("a.txt", b"new".to_vec()))).unwrap();
        let record = block_on(controller.confirm()).unwrap();

        assert_eq!(record.filename, "a(1).txt");
        assert_eq!(record.original_filename, "a.txt");
        assert_eq!(api.calls(Op::Upload), 1);
        assert_eq!(api.filenames(), vec!["a.txt", "a(1).txt"]);
    }

    #[test]
    fn confirm_without_pending_selection_fails() {
        let api = FakeApi::new();
        let controller = UploadController::new(&api);

        let err = block_on(controller.confirm()).unwrap_err();

        assert_eq!(err, FileError::Validation(ValidationError::NothingToConfirm));
        assert_eq!(api.calls(Op::Upload), 0);
    }

    #[test]
    fn transport_failure_surfaces_and_releases_busy_flag() {
        let api = FakeApi::new();
        api.fail(Op::Upload, FileError::status(500, "disk full"));
        let controller = UploadController::new(&api);

        let selection = UploadSelection::new("a.png", vec![0x89]);
        let err = block_on(controller.submit(selection)).unwrap_err();

        assert!(matches!(err, FileError::Transport { status: Some(500), .. }));
        assert!(!controller.is_busy());
    }

    #[test]
    fn second_submit_while_in_flight_is_refused() {
        let api = FakeApi::new();
        let controller = UploadController::new(&api);
        let _held = controller.in_flight.acquire("an upload").unwrap();

        let err = block_on(controller.submit(UploadSelection::new("a.txt", vec![]))).unwrap_err();

        assert_eq!(err, FileError::Busy("an upload"));
        assert_eq!(api.calls(Op::List), 0);
    }
}
