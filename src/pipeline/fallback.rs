//! Local text extraction with lopdf, used when the OCR service is unavailable.
//!
//! Reads the PDF's own text layer page by page. Scanned questionnaires have
//! no text layer and come out empty, which the pipeline tolerates.
//!
//! Parsing is CPU-bound and synchronous, so the async entry point moves it
//! onto the blocking thread pool.

use crate::error::LocalExtractionError;
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::normalize::{normalize, ExtractedText};
use lopdf::Document;
use tracing::{debug, warn};

/// Extract the text layer of `document` off the async executor.
pub async fn extract_locally(
    document: &UploadedDocument,
) -> Result<ExtractedText, LocalExtractionError> {
    let bytes = document.bytes().to_vec();
    tokio::task::spawn_blocking(move || extract_locally_blocking(&bytes))
        .await
        .map_err(|e| LocalExtractionError::Task {
            detail: format!("extraction task panicked: {e}"),
        })?
}

/// Blocking implementation of [`extract_locally`].
///
/// Pages are read in page order and concatenated. A page whose content
/// stream cannot be decoded is skipped; if no page could be read at all, the
/// first page error is returned.
pub fn extract_locally_blocking(bytes: &[u8]) -> Result<ExtractedText, LocalExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| LocalExtractionError::Parse {
        detail: e.to_string(),
    })?;

    // `get_pages` is a BTreeMap keyed by 1-based page number.
    let pages = doc.get_pages();
    debug!("Local extraction: {} pages", pages.len());

    let mut text = String::new();
    let mut pages_read = 0usize;
    let mut first_error: Option<LocalExtractionError> = None;

    for page_num in pages.keys().copied() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text);
                pages_read += 1;
            }
            Err(e) => {
                warn!("Local extraction: page {} unreadable: {}", page_num, e);
                first_error.get_or_insert(LocalExtractionError::Page {
                    page: page_num,
                    detail: e.to_string(),
                });
            }
        }
    }

    if pages_read == 0 {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    Ok(normalize(&text))
}
