//! Pipeline stages for questionnaire assessment.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ocr ─┬──────────▶ normalize ──▶ roadmap ──▶ markdown ──▶ report
//! (path/URL)     └▶ fallback ─┘             (HTTP)      (sections)   (PDF)
//! ```
//!
//! 1. [`input`]    — read a local file or download a URL into memory
//! 2. [`ocr`]      — multipart upload to the OCR service
//! 3. [`fallback`] — lopdf text-layer extraction, in `spawn_blocking`
//! 4. [`extract`]  — OCR first, fallback second, never fails
//! 5. [`normalize`] — collapse whitespace runs
//! 6. [`roadmap`]  — the only stage whose failure ends a request
//! 7. [`markdown`] — fixed five-section report
//! 8. [`report`]   — result panels and the downloadable PDF

pub mod extract;
pub mod fallback;
pub mod input;
pub mod markdown;
pub mod normalize;
pub mod ocr;
pub mod report;
pub mod roadmap;
