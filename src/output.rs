//! Output types returned by an assessment.

use crate::pipeline::extract::Extraction;
use crate::pipeline::markdown::MarkdownReport;
use crate::pipeline::report::{panels, ReportDocument, ReportPanel};
use crate::pipeline::roadmap::RoadmapResult;
use serde::{Deserialize, Serialize};

/// Everything one request produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentOutput {
    /// Display name of the uploaded document.
    pub document_name: String,

    /// Extracted text and which extractor produced it.
    pub extraction: Extraction,

    /// The roadmap service's answer.
    pub result: RoadmapResult,

    /// The formatted report.
    pub markdown: MarkdownReport,

    /// The rendered PDF, absent when rendering was disabled.
    pub report: Option<ReportDocument>,

    pub stats: AssessmentStats,
}

impl AssessmentOutput {
    /// Result panels in display order.
    pub fn panels(&self) -> Vec<ReportPanel> {
        panels(&self.result)
    }

    /// First `limit` characters of the extracted text.
    pub fn text_preview(&self, limit: usize) -> String {
        match &self.extraction {
            Extraction::Ocr { text } | Extraction::Fallback { text, .. } => text.preview(limit),
            Extraction::Unavailable { .. } => String::new(),
        }
    }
}

/// Timing and size statistics for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentStats {
    /// Size of the uploaded PDF in bytes.
    pub input_bytes: usize,

    /// Length of the normalised extracted text in characters.
    pub extracted_chars: usize,

    /// Wall-clock time for the whole request (ms).
    pub total_duration_ms: u64,

    /// Time spent in OCR and fallback extraction (ms).
    pub extraction_duration_ms: u64,

    /// Time spent waiting on the roadmap service (ms).
    pub roadmap_duration_ms: u64,

    /// Time spent rendering the PDF report (ms).
    pub render_duration_ms: u64,
}
