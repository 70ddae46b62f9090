//! Best-effort text extraction: remote OCR first, local parser second.
//!
//! [`TextExtractionClient::extract`] never fails. Its result says which path
//! produced the text and, when something went wrong, why:
//!
//! ```text
//! OCR 200 ──────────────────────────────▶ Extraction::Ocr
//! OCR error ─▶ local parser ok ─────────▶ Extraction::Fallback
//!                 └─ local parser error ─▶ Extraction::Unavailable (empty text)
//! ```
//!
//! Falling back is announced to the observer as a warning and a local
//! failure as an error, so the user sees both as they happen.

use crate::config::AssessmentConfig;
use crate::error::{AssessError, LocalExtractionError, OcrError};
use crate::pipeline::fallback;
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::normalize::ExtractedText;
use crate::pipeline::ocr::OcrClient;
use crate::progress::Observer;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Warning shown whenever the local extractor is used.
pub const FALLBACK_WARNING: &str = "Using fallback PDF extraction method";

/// Which extractor produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Ocr,
    LocalFallback,
    Unavailable,
}

/// Outcome of best-effort extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Extraction {
    /// The OCR service returned text.
    Ocr { text: ExtractedText },
    /// The OCR service failed; the local parser produced the text.
    Fallback {
        text: ExtractedText,
        reason: OcrError,
    },
    /// Both extractors failed. The text is empty.
    Unavailable {
        ocr: OcrError,
        local: LocalExtractionError,
    },
}

impl Extraction {
    /// The extracted text; empty for [`Extraction::Unavailable`].
    pub fn text(&self) -> &str {
        match self {
            Extraction::Ocr { text } | Extraction::Fallback { text, .. } => text.as_str(),
            Extraction::Unavailable { .. } => "",
        }
    }

    pub fn into_text(self) -> ExtractedText {
        match self {
            Extraction::Ocr { text } | Extraction::Fallback { text, .. } => text,
            Extraction::Unavailable { .. } => ExtractedText::empty(),
        }
    }

    pub fn source(&self) -> ExtractionSource {
        match self {
            Extraction::Ocr { .. } => ExtractionSource::Ocr,
            Extraction::Fallback { .. } => ExtractionSource::LocalFallback,
            Extraction::Unavailable { .. } => ExtractionSource::Unavailable,
        }
    }

    /// True when the local parser was consulted.
    pub fn used_fallback(&self) -> bool {
        !matches!(self, Extraction::Ocr { .. })
    }
}

/// OCR client plus local fallback.
pub struct TextExtractionClient {
    ocr: OcrClient,
    observer: Option<Observer>,
}

impl TextExtractionClient {
    pub fn new(config: &AssessmentConfig) -> Result<Self, AssessError> {
        Ok(Self {
            ocr: OcrClient::new(config)?,
            observer: config.observer.clone(),
        })
    }

    /// Extract the document's text, degrading to the local parser and then to
    /// empty text instead of failing.
    pub async fn extract(&self, document: &UploadedDocument) -> Extraction {
        let reason = match self.ocr.extract(document).await {
            Ok(text) => {
                info!("OCR extracted {} characters", text.char_count());
                return Extraction::Ocr { text };
            }
            Err(e) => e,
        };

        warn!("OCR failed ({}); {}", reason, FALLBACK_WARNING);
        if let Some(ref o) = self.observer {
            o.on_warning(FALLBACK_WARNING);
        }

        match fallback::extract_locally(document).await {
            Ok(text) => {
                info!("Local extraction produced {} characters", text.char_count());
                Extraction::Fallback { text, reason }
            }
            Err(local) => {
                error!("{}", local);
                if let Some(ref o) = self.observer {
                    o.on_error(&local.to_string());
                }
                Extraction::Unavailable { ocr: reason, local }
            }
        }
    }
}
