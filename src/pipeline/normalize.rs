//! Whitespace normalisation: any text → one line of single-spaced tokens.
//!
//! The roadmap service expects the questionnaire as a single line. OCR output
//! and PDF text layers both arrive with hard line breaks, tabs and runs of
//! spaces, so every extractor funnels its result through [`normalize`].
//! [`ExtractedText`] can only be built that way, which keeps the invariant
//! (no `\n`/`\t`, no double spaces, no outer whitespace) true by construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single line of text with every whitespace run collapsed to one space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ExtractedText(String);

impl ExtractedText {
    /// The empty text, used when no extractor produced anything.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters (not bytes).
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// At most `limit` characters, followed by `...` when the text is longer.
    pub fn preview(&self, limit: usize) -> String {
        match self.0.char_indices().nth(limit) {
            Some((cut, _)) => format!("{}...", &self.0[..cut]),
            None => self.0.clone(),
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ExtractedText {
    fn from(s: String) -> Self {
        normalize(&s)
    }
}

impl From<ExtractedText> for String {
    fn from(t: ExtractedText) -> Self {
        t.0
    }
}

impl AsRef<str> for ExtractedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse every whitespace run (spaces, tabs, newlines, Unicode spaces)
/// into a single space and trim both ends.
pub fn normalize(text: &str) -> ExtractedText {
    let mut out = String::with_capacity(text.len());
    for token in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    ExtractedText(out)
}
