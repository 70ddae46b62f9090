//! Configuration types for a questionnaire assessment.
//!
//! All behaviour is controlled through [`AssessmentConfig`], built via its
//! [`AssessmentConfigBuilder`]. The OCR API key is the one required value:
//! [`AssessmentConfigBuilder::build`] refuses to produce a config without it,
//! so a missing secret halts the application before any input is read.
//!
//! The config is passed explicitly into every client; nothing reads the
//! environment behind the caller's back except [`AssessmentConfig::from_env`].

use crate::error::AssessError;
use crate::progress::AssessmentObserver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the OCR API key.
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

/// Default OCR text-extraction endpoint.
pub const DEFAULT_OCR_URL: &str = "https://ocr-text-extraction.p.rapidapi.com/v1/ocr/";

/// Default value of the `X-RapidAPI-Host` header.
pub const DEFAULT_OCR_HOST: &str = "ocr-text-extraction.p.rapidapi.com";

/// Default roadmap-generation endpoint.
pub const DEFAULT_ROADMAP_URL: &str =
    "https://visa-roadmap-247572588539.us-central1.run.app/generate_roadmap";

/// Bullet glyph the roadmap service uses between questionnaire answers.
pub const DEFAULT_BULLET: &str = "●";

/// Glyphs tried, in order, by [`BulletDelimiter::Detect`].
///
/// `U+F0B7` is the private-use bullet Word's Symbol font leaks into PDFs.
pub const BULLET_CANDIDATES: &[&str] = &["●", "•", "▪", "◦", "\u{f0b7}"];

/// Configuration for one assessment request.
///
/// Built via [`AssessmentConfig::builder()`] or [`AssessmentConfig::from_env()`].
///
/// # Example
/// ```rust
/// use immigration_roadmap::AssessmentConfig;
///
/// let config = AssessmentConfig::builder()
///     .api_key("my-rapidapi-key")
///     .roadmap_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.roadmap_timeout_secs, 90);
/// ```
#[derive(Clone)]
pub struct AssessmentConfig {
    /// OCR endpoint receiving the multipart upload.
    pub ocr_url: String,

    /// Value sent as `X-RapidAPI-Host`.
    pub ocr_host: String,

    /// Value sent as `X-RapidAPI-Key`. Never printed by `Debug`.
    pub api_key: String,

    /// Roadmap-generation endpoint receiving `{"questionnaire": …}`.
    pub roadmap_url: String,

    /// Timeout for the OCR call in seconds. Default: 60.
    ///
    /// On timeout the local extractor takes over, so this only bounds how
    /// long the user waits before fallback.
    pub ocr_timeout_secs: u64,

    /// Timeout for the roadmap call in seconds. Default: 120.
    ///
    /// Roadmap generation runs a language model server-side and routinely
    /// takes tens of seconds.
    pub roadmap_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// How the questionnaire field is split into list items.
    pub delimiter: BulletDelimiter,

    /// Number of characters shown in the extracted-text preview. Default: 500.
    pub preview_chars: usize,

    /// Render the downloadable PDF report. Default: true.
    pub render_report: bool,

    /// Receives warnings, errors and stage events for the user interface.
    pub observer: Option<Arc<dyn AssessmentObserver>>,
}

impl fmt::Debug for AssessmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentConfig")
            .field("ocr_url", &self.ocr_url)
            .field("ocr_host", &self.ocr_host)
            .field("api_key", &"<redacted>")
            .field("roadmap_url", &self.roadmap_url)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("roadmap_timeout_secs", &self.roadmap_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("delimiter", &self.delimiter)
            .field("preview_chars", &self.preview_chars)
            .field("render_report", &self.render_report)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn AssessmentObserver>"),
            )
            .finish()
    }
}

impl AssessmentConfig {
    /// Create a new builder. The API key must be set before `build()`.
    pub fn builder() -> AssessmentConfigBuilder {
        AssessmentConfigBuilder {
            api_key: None,
            ocr_url: DEFAULT_OCR_URL.to_string(),
            ocr_host: DEFAULT_OCR_HOST.to_string(),
            roadmap_url: DEFAULT_ROADMAP_URL.to_string(),
            ocr_timeout_secs: 60,
            roadmap_timeout_secs: 120,
            download_timeout_secs: 120,
            delimiter: BulletDelimiter::default(),
            preview_chars: 500,
            render_report: true,
            observer: None,
        }
    }

    /// Build a config from the process environment.
    ///
    /// Reads `RAPIDAPI_KEY` (required) and the optional overrides
    /// `OCR_API_URL`, `OCR_API_HOST` and `ROADMAP_API_URL`.
    pub fn from_env() -> Result<Self, AssessError> {
        let mut builder = Self::builder();
        if let Some(key) = env_non_empty(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(url) = env_non_empty("OCR_API_URL") {
            builder = builder.ocr_url(url);
        }
        if let Some(host) = env_non_empty("OCR_API_HOST") {
            builder = builder.ocr_host(host);
        }
        if let Some(url) = env_non_empty("ROADMAP_API_URL") {
            builder = builder.roadmap_url(url);
        }
        builder.build()
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`AssessmentConfig`].
pub struct AssessmentConfigBuilder {
    api_key: Option<String>,
    ocr_url: String,
    ocr_host: String,
    roadmap_url: String,
    ocr_timeout_secs: u64,
    roadmap_timeout_secs: u64,
    download_timeout_secs: u64,
    delimiter: BulletDelimiter,
    preview_chars: usize,
    render_report: bool,
    observer: Option<Arc<dyn AssessmentObserver>>,
}

impl fmt::Debug for AssessmentConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentConfigBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("ocr_url", &self.ocr_url)
            .field("roadmap_url", &self.roadmap_url)
            .finish_non_exhaustive()
    }
}

impl AssessmentConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn ocr_url(mut self, url: impl Into<String>) -> Self {
        self.ocr_url = url.into();
        self
    }

    pub fn ocr_host(mut self, host: impl Into<String>) -> Self {
        self.ocr_host = host.into();
        self
    }

    pub fn roadmap_url(mut self, url: impl Into<String>) -> Self {
        self.roadmap_url = url.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.ocr_timeout_secs = secs;
        self
    }

    pub fn roadmap_timeout_secs(mut self, secs: u64) -> Self {
        self.roadmap_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.download_timeout_secs = secs;
        self
    }

    pub fn delimiter(mut self, delimiter: BulletDelimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn preview_chars(mut self, n: usize) -> Self {
        self.preview_chars = n;
        self
    }

    pub fn render_report(mut self, enabled: bool) -> Self {
        self.render_report = enabled;
        self
    }

    /// Attach an observer that receives warnings, errors and stage events.
    pub fn observer(mut self, observer: Arc<dyn AssessmentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AssessmentConfig, AssessError> {
        let api_key = match self.api_key {
            Some(k) if !k.trim().is_empty() => k,
            _ => {
                return Err(AssessError::MissingSecret {
                    name: API_KEY_ENV.to_string(),
                })
            }
        };

        for (label, url) in [("OCR", &self.ocr_url), ("roadmap", &self.roadmap_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AssessError::InvalidConfig(format!(
                    "{label} endpoint must be an HTTP/HTTPS URL, got '{url}'"
                )));
            }
        }

        if self.ocr_timeout_secs == 0
            || self.roadmap_timeout_secs == 0
            || self.download_timeout_secs == 0
        {
            return Err(AssessError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }

        if let BulletDelimiter::Fixed(ref glyph) = self.delimiter {
            if glyph.is_empty() {
                return Err(AssessError::InvalidConfig(
                    "Bullet delimiter must not be empty".into(),
                ));
            }
        }

        Ok(AssessmentConfig {
            ocr_url: self.ocr_url,
            ocr_host: self.ocr_host,
            api_key,
            roadmap_url: self.roadmap_url,
            ocr_timeout_secs: self.ocr_timeout_secs,
            roadmap_timeout_secs: self.roadmap_timeout_secs,
            download_timeout_secs: self.download_timeout_secs,
            delimiter: self.delimiter,
            preview_chars: self.preview_chars,
            render_report: self.render_report,
            observer: self.observer,
        })
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the questionnaire answers are separated in the roadmap response.
///
/// The service emits a `●` glyph between answers, most likely carried over
/// from the bullet list in the source document. Other producers use other
/// glyphs, so the delimiter can be pinned or detected per response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletDelimiter {
    /// Always split on this exact string.
    Fixed(String),
    /// Split on the first of [`BULLET_CANDIDATES`] present in the text,
    /// or [`DEFAULT_BULLET`] when none is.
    Detect,
}

impl Default for BulletDelimiter {
    fn default() -> Self {
        BulletDelimiter::Fixed(DEFAULT_BULLET.to_string())
    }
}

impl BulletDelimiter {
    /// Parse a CLI-style value: `auto` selects detection, anything else is a
    /// fixed glyph.
    pub fn from_arg(s: &str) -> Self {
        if s.eq_ignore_ascii_case("auto") {
            BulletDelimiter::Detect
        } else {
            BulletDelimiter::Fixed(s.to_string())
        }
    }

    /// The delimiter to use for `text`.
    pub fn resolve(&self, text: &str) -> &str {
        match self {
            BulletDelimiter::Fixed(glyph) => glyph,
            BulletDelimiter::Detect => BULLET_CANDIDATES
                .iter()
                .copied()
                .find(|c| text.contains(c))
                .unwrap_or(DEFAULT_BULLET),
        }
    }
}
