//! Turns a stored file's bytes plus its declared content type into something a
//! view can render.
//!
//! Dispatch is on the declared `Content-Type` only; the bytes are never sniffed.
//! The first matching rule wins:
//!
//! 1. `image/*` → base64 payload, see [`Preview::data_uri`]
//! 2. `text/*` or `application/json` → UTF-8 text
//! 3. `application/pdf` → raw bytes, to be shown through a transient object URL
//! 4. anything else → [`FileError::UnsupportedPreview`]

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::api::{FileApi, FileContent};
use crate::format::media_essence;
use crate::{FileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Text,
    Pdf,
    Other,
}

impl PreviewKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = media_essence(content_type);
        if essence.starts_with("image/") {
            Self::Image
        } else if essence.starts_with("text/") || essence == "application/json" {
            Self::Text
        } else if essence == "application/pdf" {
            Self::Pdf
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::Other => "file",
        }
    }
}

/// A resolved preview. `content_type` is always the header value the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Image { base64: String, content_type: String },
    Text { text: String, content_type: String },
    Pdf { bytes: Vec<u8>, content_type: String },
}

impl Preview {
    pub fn content_type(&self) -> &str {
        match self {
            Self::Image { content_type, .. }
            | Self::Text { content_type, .. }
            | Self::Pdf { content_type, .. } => content_type,
        }
    }

    pub fn kind(&self) -> PreviewKind {
        match self {
            Self::Image { .. } => PreviewKind::Image,
            Self::Text { .. } => PreviewKind::Text,
            Self::Pdf { .. } => PreviewKind::Pdf,
        }
    }

    /// `data:<type>;base64,<payload>` for images, `None` otherwise.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            Self::Image {
                base64,
                content_type,
            } => Some(format!("data:{content_type};base64,{base64}")),
            _ => None,
        }
    }
}

pub fn resolve_content(content: FileContent) -> Result<Preview> {
    let FileContent {
        bytes,
        content_type,
    } = content;

    match PreviewKind::from_content_type(&content_type) {
        PreviewKind::Image => Ok(Preview::Image {
            base64: STANDARD.encode(&bytes),
            content_type,
        }),
        PreviewKind::Text => {
            let text = String::from_utf8(bytes).map_err(|e| FileError::Decode(e.to_string()))?;
            Ok(Preview::Text { text, content_type })
        }
        PreviewKind::Pdf => Ok(Preview::Pdf {
            bytes,
            content_type,
        }),
        PreviewKind::Other => Err(FileError::UnsupportedPreview(content_type)),
    }
}

pub struct PreviewResolver<A> {
    api: A,
}

impl<A: FileApi> PreviewResolver<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Fetches `filename` from the preview endpoint and resolves it.
    /// `NotFound` from the API is passed through untouched.
    pub async fn resolve(&self, filename: &str) -> Result<Preview> {
        let content = self.api.preview(filename).await?;
        log::debug!(
            "previewing {} ({} bytes, {})",
            filename,
            content.bytes.len(),
            content.content_type
        );
        let preview = resolve_content(content);
        if let Err(err) = &preview {
            log::warn!("preview of {} failed: {}", filename, err);
        }
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, Op};
    use futures::executor::block_on;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0xFF];

    fn content(bytes: &[u8], content_type: &str) -> FileContent {
        FileContent {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn kind_dispatch_follows_priority_order() {
        assert_eq!(PreviewKind::from_content_type("image/png"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("image/svg+xml"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("text/plain"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("text/csv; charset=utf-8"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/json"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/pdf"), PreviewKind::Pdf);
        assert_eq!(PreviewKind::from_content_type("application/zip"), PreviewKind::Other);
        assert_eq!(PreviewKind::from_content_type("application/jsonl"), PreviewKind::Other);
        assert_eq!(PreviewKind::from_content_type(""), PreviewKind::Other);
    }

    #[test]
    fn text_is_the_utf8_decoding_of_the_bytes() {
        for content_type in ["text/plain", "text/html", "application/json"] {
            let body = "héllo {\"k\": 1} ✓";
            let preview = resolve_content(content(body.as_bytes(), content_type)).unwrap();
            assert_eq!(
                preview,
                Preview::Text {
                    text: body.to_string(),
                    content_type: content_type.to_string(),
                }
            );
        }
    }

    #[test]
    fn invalid_utf8_text_is_a_decode_error() {
        let err = resolve_content(content(&[0x66, 0xFF, 0xFE], "text/plain")).unwrap_err();
        assert!(matches!(err, FileError::Decode(_)));
    }

    #[test]
    fn image_payload_round_trips_through_base64() {
        let preview = resolve_content(content(PNG_BYTES, "image/png")).unwrap();
        let Preview::Image { base64, content_type } = &preview else {
            panic!("expected image preview, got {preview:?}");
        };
        assert_eq!(content_type, "image/png");
        assert_eq!(STANDARD.decode(base64).unwrap(), PNG_BYTES);
        assert_eq!(
            preview.data_uri().unwrap(),
            format!("data:image/png;base64,{base64}")
        );
    }

    #[test]
    fn pdf_keeps_raw_bytes() {
        let preview = resolve_content(content(b"%PDF-1.7", "application/pdf")).unwrap();
        assert_eq!(preview.kind(), PreviewKind::Pdf);
        assert_eq!(preview.data_uri(), None);
        assert!(matches!(preview, Preview::Pdf { ref bytes, .. } if bytes == b"%PDF-1.7"));
    }

    #[test]
    fn unknown_types_are_rejected_not_decoded() {
        let err = resolve_content(content(b"plain ascii", "application/octet-stream")).unwrap_err();
        assert_eq!(
            err,
            FileError::UnsupportedPreview("application/octet-stream".to_string())
        );
    }

    #[test]
    fn declared_content_type_is_returned_verbatim() {
        let preview = resolve_content(content(b"{}", "Application/JSON; charset=UTF-8")).unwrap();
        assert_eq!(preview.content_type(), "Application/JSON; charset=UTF-8");
    }

    #[test]
    fn resolver_previews_listed_text_file() {
        let api = FakeApi::new().with_file("a.txt", "text/plain", b"hello");
        let resolver = PreviewResolver::new(&api);

        let preview = block_on(resolver.resolve("a.txt")).unwrap();

        assert_eq!(
            preview,
            Preview::Text {
                text: "hello".to_string(),
                content_type: "text/plain".to_string(),
            }
        );
        assert_eq!(api.calls(Op::Preview), 1);
        assert_eq!(api.calls(Op::Download), 0);
    }

    #[test]
    fn resolver_passes_not_found_through() {
        let api = FakeApi::new();
        let resolver = PreviewResolver::new(&api);

        let err = block_on(resolver.resolve("missing.png")).unwrap_err();

        assert_eq!(err, FileError::NotFound("missing.png".to_string()));
    }

    #[test]
    fn resolver_surfaces_transport_errors() {
        let api = FakeApi::new().with_file("a.png", "image/png", PNG_BYTES);
        api.fail(Op::Preview, FileError::status(503, "unavailable"));
        let resolver = PreviewResolver::new(&api);

        let err = block_on(resolver.resolve("a.png")).unwrap_err();

        assert!(matches!(err, FileError::Transport { status: Some(503), .. }));
    }
}
