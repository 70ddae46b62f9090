//! End-to-end assessment entry points.
//!
//! One request is one sequential chain:
//!
//! ```text
//! resolve ─▶ extract (OCR ▸ local ▸ empty) ─▶ roadmap ─▶ markdown ─▶ PDF
//! ```
//!
//! Only input errors and a failed roadmap call end the request; extraction
//! problems are reported and the chain continues with whatever text is left.

use crate::config::AssessmentConfig;
use crate::error::AssessError;
use crate::output::{AssessmentOutput, AssessmentStats};
use crate::pipeline::extract::{Extraction, TextExtractionClient};
use crate::pipeline::input::{self, UploadedDocument};
use crate::pipeline::markdown;
use crate::pipeline::report;
use crate::pipeline::roadmap::RoadmapClient;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Run best-effort text extraction on an uploaded document.
///
/// Extraction problems are carried in the returned [`Extraction`]; this only
/// fails when the HTTP client cannot be built.
pub async fn extract_text(
    document: &UploadedDocument,
    config: &AssessmentConfig,
) -> Result<Extraction, AssessError> {
    let client = TextExtractionClient::new(config)?;
    Ok(run_extraction(&client, document, config).await)
}

/// Assess a questionnaire given as a local path or HTTP/HTTPS URL.
///
/// # Errors
/// Returns `Err(AssessError)` only for fatal errors:
/// - File not found / permission denied / download failure
/// - Not a PDF
/// - Roadmap service failure ([`AssessError::Roadmap`])
/// - Report rendering failure
pub async fn assess(
    input_str: impl AsRef<str>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, AssessError> {
    let input_str = input_str.as_ref();
    info!("Starting assessment: {}", input_str);

    let document = input::resolve_input(input_str, config.download_timeout_secs).await?;
    assess_document(document, config).await
}

/// Assess a questionnaire already held in memory, e.g. a browser upload.
///
/// `name` is the display name used in logs and events.
pub async fn assess_from_bytes(
    bytes: Vec<u8>,
    name: impl Into<String>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, AssessError> {
    let document = UploadedDocument::new(name, bytes)?;
    assess_document(document, config).await
}

/// Assess a questionnaire and write the PDF report to `output_path`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed run never leaves a partial report behind.
pub async fn assess_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, AssessError> {
    let mut config = config.clone();
    config.render_report = true;
    let output = assess(input_str, &config).await?;

    let bytes = output
        .report
        .as_ref()
        .map(|r| r.bytes.clone())
        .ok_or_else(|| AssessError::Internal("Report was not rendered".into()))?;
    write_atomic(output_path.as_ref().to_path_buf(), bytes).await?;

    Ok(output)
}

/// Synchronous wrapper around [`assess`].
///
/// Creates a temporary tokio runtime internally.
pub fn assess_sync(
    input_str: impl AsRef<str>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, AssessError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AssessError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(assess(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn assess_document(
    document: UploadedDocument,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, AssessError> {
    let total_start = Instant::now();
    let extractor = TextExtractionClient::new(config)?;
    let roadmap = RoadmapClient::new(config)?;

    // ── Step 1: Extract text ─────────────────────────────────────────────
    let extraction_start = Instant::now();
    let extraction = run_extraction(&extractor, &document, config).await;
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    let text = extraction.clone().into_text();
    if text.is_empty() {
        // The service still gets a request; it decides what an empty
        // questionnaire means.
        warn!("No text extracted from '{}'", document.name());
        if let Some(ref o) = config.observer {
            o.on_warning("No text could be extracted from the PDF");
        }
    }

    // ── Step 2: Generate roadmap ─────────────────────────────────────────
    if let Some(ref o) = config.observer {
        o.on_roadmap_start();
    }
    let roadmap_start = Instant::now();
    let result = match roadmap.generate(&text).await {
        Ok(result) => result,
        Err(e) => {
            error!("Roadmap generation failed: {}", e);
            if let Some(ref o) = config.observer {
                o.on_error(&e.to_string());
            }
            return Err(e.into());
        }
    };
    let roadmap_duration_ms = roadmap_start.elapsed().as_millis() as u64;
    if let Some(ref o) = config.observer {
        o.on_roadmap_complete();
    }

    // ── Step 3: Format ───────────────────────────────────────────────────
    let markdown = markdown::to_markdown(&result, &config.delimiter);

    // ── Step 4: Render ───────────────────────────────────────────────────
    let render_start = Instant::now();
    let report = if config.render_report {
        let doc = report::render_pdf(&markdown.to_markdown()).await?;
        if let Some(ref o) = config.observer {
            o.on_report_ready(doc.page_count, doc.bytes.len());
        }
        Some(doc)
    } else {
        None
    };
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = AssessmentStats {
        input_bytes: document.len(),
        extracted_chars: text.char_count(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extraction_duration_ms,
        roadmap_duration_ms,
        render_duration_ms,
    };

    info!(
        "Assessment complete for '{}': {}ms total",
        document.name(),
        stats.total_duration_ms
    );

    Ok(AssessmentOutput {
        document_name: document.name().to_string(),
        extraction,
        result,
        markdown,
        report,
        stats,
    })
}

async fn run_extraction(
    client: &TextExtractionClient,
    document: &UploadedDocument,
    config: &AssessmentConfig,
) -> Extraction {
    if let Some(ref o) = config.observer {
        o.on_extraction_start(document.name(), document.len());
    }
    let extraction = client.extract(document).await;
    if let Some(ref o) = config.observer {
        o.on_extraction_complete(extraction.source(), extraction.text().chars().count());
    }
    extraction
}

async fn write_atomic(path: std::path::PathBuf, bytes: Vec<u8>) -> Result<(), AssessError> {
    tokio::task::spawn_blocking(move || {
        let write_err = |source: std::io::Error| AssessError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        info!("Wrote report to {}", path.display());
        Ok(())
    })
    .await
    .map_err(|e| AssessError::Internal(format!("Write task panicked: {e}")))?
}
