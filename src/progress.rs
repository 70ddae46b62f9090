//! Observer trait for user-visible pipeline events.
//!
//! Inject an [`Arc<dyn AssessmentObserver>`] via
//! [`crate::config::AssessmentConfigBuilder::observer`] to receive stage
//! events, non-fatal warnings and reported errors as one request runs.
//!
//! Every recoverable failure (OCR fallback, local extraction failure) and the
//! terminal roadmap failure is announced here as well as being carried in the
//! return types, so a UI can show it immediately instead of the failure being
//! swallowed.
//!
//! # Example
//!
//! ```rust
//! use immigration_roadmap::{AssessmentConfig, AssessmentObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Collect {
//!     warnings: Mutex<Vec<String>>,
//! }
//!
//! impl AssessmentObserver for Collect {
//!     fn on_warning(&self, message: &str) {
//!         self.warnings.lock().unwrap().push(message.to_string());
//!     }
//! }
//!
//! let config = AssessmentConfig::builder()
//!     .api_key("k")
//!     .observer(Arc::new(Collect::default()) as Arc<dyn AssessmentObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::extract::ExtractionSource;
use std::sync::Arc;

/// Called by the pipeline as it processes one request.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AssessmentObserver: Send + Sync {
    /// Called before the OCR request is sent.
    ///
    /// # Arguments
    /// * `name`  — display name of the uploaded document
    /// * `bytes` — size of the PDF in bytes
    fn on_extraction_start(&self, name: &str, bytes: usize) {
        let _ = (name, bytes);
    }

    /// A non-fatal problem the user should see, e.g. the fallback extractor
    /// being used.
    fn on_warning(&self, message: &str) {
        let _ = message;
    }

    /// A failure the user should see. May or may not end the request.
    fn on_error(&self, message: &str) {
        let _ = message;
    }

    /// Called once text extraction has finished, successfully or not.
    ///
    /// # Arguments
    /// * `source` — which extractor produced the text
    /// * `chars`  — length of the normalised text in characters
    fn on_extraction_complete(&self, source: ExtractionSource, chars: usize) {
        let _ = (source, chars);
    }

    /// Called just before the roadmap request is sent.
    fn on_roadmap_start(&self) {}

    /// Called when the roadmap service returned a usable result.
    fn on_roadmap_complete(&self) {}

    /// Called when the PDF report has been rendered.
    ///
    /// # Arguments
    /// * `pages` — number of pages in the report
    /// * `bytes` — size of the report in bytes
    fn on_report_ready(&self, pages: usize, bytes: usize) {
        let _ = (pages, bytes);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl AssessmentObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::AssessmentConfig`].
pub type Observer = Arc<dyn AssessmentObserver>;
