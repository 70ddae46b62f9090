//! # immigration-roadmap
//!
//! Turn a filled-in immigration questionnaire (PDF) into a personalised
//! Canadian immigration assessment.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   OCR service, local lopdf fallback, or empty text
//!  ├─ 3. Roadmap   POST the questionnaire text to the roadmap service
//!  ├─ 4. Format    five-section Markdown report
//!  └─ 5. Render    result panels + immigration_assessment.pdf
//! ```
//!
//! Extraction never stops a request: an OCR failure falls back to the PDF's
//! own text layer, and a failure there continues with empty text. A failed
//! roadmap call ends the request with [`AssessError::Roadmap`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use immigration_roadmap::{assess, AssessmentConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads RAPIDAPI_KEY; fails fast when it is missing.
//!     let config = AssessmentConfig::from_env()?;
//!     let output = assess("questionnaire.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     for panel in output.panels() {
//!         println!("## {}\n{}", panel.title, panel.body);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `roadmap` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! immigration-roadmap = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assess;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assess::{assess, assess_from_bytes, assess_sync, assess_to_file, extract_text};
pub use config::{AssessmentConfig, AssessmentConfigBuilder, BulletDelimiter};
pub use error::{AssessError, LocalExtractionError, OcrError, RoadmapError};
pub use output::{AssessmentOutput, AssessmentStats};
pub use pipeline::extract::{Extraction, ExtractionSource, TextExtractionClient};
pub use pipeline::input::UploadedDocument;
pub use pipeline::markdown::{to_markdown, MarkdownReport, Section};
pub use pipeline::normalize::{normalize, ExtractedText};
pub use pipeline::report::{panels, render_pdf, ReportDocument, ReportPanel};
pub use pipeline::roadmap::{RoadmapClient, RoadmapResult};
pub use progress::{AssessmentObserver, NoopObserver};
