//! Error types for the immigration-roadmap library.
//!
//! Two layers of error reflect two distinct failure modes:
//!
//! * [`AssessError`] — **Fatal**: the request cannot produce a report at all
//!   (bad input file, missing API key, roadmap service failed). Returned as
//!   `Err(AssessError)` from the top-level `assess*` functions.
//!
//! * [`OcrError`], [`LocalExtractionError`], [`RoadmapError`] — the outcome
//!   of a single remote or local call. Extraction errors are **recoverable**:
//!   they are stored inside [`crate::pipeline::extract::Extraction`] and the
//!   pipeline carries on with fallback or empty text. A [`RoadmapError`] ends
//!   the request and is wrapped into [`AssessError::Roadmap`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the immigration-roadmap library.
#[derive(Debug, Error)]
pub enum AssessError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a PDF file (first bytes: {magic:?})\nOnly PDF questionnaires are accepted.")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required secret credential is absent or empty.
    #[error("Missing required secret '{name}'.\nSet it in the environment, e.g. export {name}=<your key>")]
    MissingSecret { name: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The roadmap service did not return a usable result.
    #[error(transparent)]
    Roadmap(#[from] RoadmapError),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Writing the PDF report failed.
    #[error("Failed to render PDF report: {0}")]
    ReportRenderFailed(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the remote OCR service did not produce text.
///
/// Never fatal: every variant triggers the local fallback extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum OcrError {
    /// The service answered with a status other than 200.
    #[error("OCR service returned HTTP {status}")]
    Status { status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("OCR request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection or protocol failure.
    #[error("OCR request failed: {detail}")]
    Transport { detail: String },

    /// HTTP 200, but the body was not the expected JSON.
    #[error("OCR response could not be parsed: {detail}")]
    InvalidResponse { detail: String },
}

/// The local PDF parser could not read the document.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocalExtractionError {
    /// Document structure (header, xref, objects) could not be loaded.
    #[error("Error in text extraction: {detail}")]
    Parse { detail: String },

    /// A page's content stream could not be decoded.
    #[error("Error in text extraction: page {page}: {detail}")]
    Page { page: u32, detail: String },

    /// The blocking extraction task did not finish.
    #[error("Error in text extraction: {detail}")]
    Task { detail: String },
}

/// Outcome of a failed roadmap-generation call.
///
/// The `Display` strings are what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RoadmapError {
    /// The service has no data for this questionnaire.
    #[error("API Error: Data Not Found (404)")]
    NotFound,

    /// Any other non-200 status.
    #[error("API Error: {status}")]
    Status { status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("API Error: request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection or protocol failure.
    #[error("API Error: {detail}")]
    Transport { detail: String },

    /// HTTP 200, but the body was not a roadmap result.
    #[error("API Error: invalid response body: {detail}")]
    InvalidResponse { detail: String },
}

impl RoadmapError {
    /// HTTP status carried by this error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RoadmapError::NotFound => Some(404),
            RoadmapError::Status { status } => Some(*status),
            _ => None,
        }
    }
}
