//! Attachment extractor — turns an uploaded document into plain text.
//!
//! Only PDF is supported. The bytes are written to a scoped temporary file
//! (removed when it goes out of scope, including on error and panic), the
//! parser runs on a blocking thread, and its text is returned.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use counselor_core::config::schema::AttachmentsConfig;
use counselor_core::utils::expand_home;
use counselor_core::ChatError;
use tracing::{debug, warn};

/// Magic header every PDF starts with.
const PDF_MAGIC: &[u8] = b"%PDF-";

// ─────────────────────────────────────────────
// DocumentParser
// ─────────────────────────────────────────────

/// Reads a document from disk and returns its text, pages in order.
///
/// Called on a blocking thread. Errors are returned as plain messages.
pub trait DocumentParser: Send + Sync + 'static {
    fn parse(&self, path: &Path) -> Result<String, String>;
}

/// PDF parser backed by `pdf-extract`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> Result<String, String> {
        pdf_extract::extract_text(path).map_err(|e| e.to_string())
    }
}

// ─────────────────────────────────────────────
// AttachmentExtractor
// ─────────────────────────────────────────────

pub struct AttachmentExtractor {
    parser: Arc<dyn DocumentParser>,
    temp_dir: Option<PathBuf>,
    max_bytes: usize,
}

impl std::fmt::Debug for AttachmentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentExtractor")
            .field("temp_dir", &self.temp_dir)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl AttachmentExtractor {
    pub fn new(parser: Arc<dyn DocumentParser>, temp_dir: Option<PathBuf>, max_bytes: usize) -> Self {
        Self {
            parser,
            temp_dir,
            max_bytes,
        }
    }

    /// PDF extractor configured from the `attachments` config section.
    pub fn from_config(config: &AttachmentsConfig) -> Self {
        Self::new(
            Arc::new(PdfParser),
            config.temp_dir.as_deref().map(expand_home),
            config.max_bytes,
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Extract the text of an uploaded document.
    ///
    /// `declared_name` is only used for diagnostics; it never becomes part of
    /// a filesystem path. An empty document yields `""`.
    pub async fn extract(&self, bytes: Vec<u8>, declared_name: &str) -> Result<String, ChatError> {
        if bytes.len() > self.max_bytes {
            return Err(ChatError::InvalidRequest(format!(
                "attachment is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }
        if !bytes.starts_with(PDF_MAGIC) {
            debug!(name = declared_name, size = bytes.len(), "rejecting non-PDF attachment");
            return Err(ChatError::UnsupportedFormat(format!(
                "'{}' is not a PDF document",
                declared_name
            )));
        }

        let parser = Arc::clone(&self.parser);
        let temp_dir = self.temp_dir.clone();
        let size = bytes.len();

        let joined = tokio::task::spawn_blocking(move || {
            let mut file = scoped_temp_file(temp_dir.as_deref())
                .map_err(|e| format!("cannot create temporary file: {e}"))?;
            file.write_all(&bytes)
                .and_then(|()| file.flush())
                .map_err(|e| format!("cannot write temporary file: {e}"))?;
            parser.parse(file.path())
            // `file` drops here and the temporary file is removed
        })
        .await;

        match joined {
            Ok(Ok(text)) => {
                debug!(name = declared_name, size, chars = text.len(), "extracted attachment text");
                Ok(text)
            }
            Ok(Err(msg)) => {
                warn!(name = declared_name, error = %msg, "attachment parse failed");
                Err(ChatError::ExtractionFailed(msg))
            }
            Err(e) if e.is_panic() => {
                warn!(name = declared_name, "document parser panicked");
                Err(ChatError::ExtractionFailed("document parser crashed".into()))
            }
            Err(e) => Err(ChatError::ExtractionFailed(e.to_string())),
        }
    }
}

fn scoped_temp_file(dir: Option<&Path>) -> std::io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("counselor-upload-").suffix(".pdf");
    match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
