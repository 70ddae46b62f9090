//! Roadmap result → Markdown report.
//!
//! The layout is fixed: a title followed by five numbered sections, always
//! all five and always in this order, whatever the service left empty. Field
//! values are inserted verbatim. The service already writes Markdown in
//! `job_roles`, `crs_score` and `roadmap`, so nothing is escaped.

use crate::config::BulletDelimiter;
use crate::pipeline::roadmap::RoadmapResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Report title (level-1 heading).
pub const REPORT_TITLE: &str = "Immigration Profile Report";

/// The five section headings (level 2), in order.
pub const SECTION_HEADINGS: [&str; 5] = [
    "1. Questionnaire and Response:",
    "2. Job Roles Based on Education and Work Experience:",
    "3. NOC Codes:",
    "4. CRS Score Breakdown:",
    "5. Roadmap for Canada Immigration:",
];

/// One numbered section of the report.
///
/// List sections (questionnaire, NOC codes) carry `items`. Free-text
/// sections carry the service's Markdown verbatim in `body`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Section {
    fn list(heading: &str, items: impl IntoIterator<Item = String>) -> Self {
        Self {
            heading: heading.to_string(),
            items: items.into_iter().collect(),
            body: None,
        }
    }

    fn text(heading: &str, body: &str) -> Self {
        Self {
            heading: heading.to_string(),
            items: Vec::new(),
            body: Some(body.to_string()),
        }
    }
}

/// The report as a title plus its sections.
///
/// The structure is kept as built, so headings or list markers inside a
/// pass-through field never change the section count. Flattened to Markdown
/// only by [`blocks`](Self::blocks) and [`to_markdown`](Self::to_markdown).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownReport {
    pub title: String,
    pub sections: Vec<Section>,
}

impl MarkdownReport {
    /// Markdown blocks in document order, each ending with `\n`.
    pub fn blocks(&self) -> Vec<String> {
        let mut blocks = vec![format!("# {}\n", self.title)];
        for section in &self.sections {
            blocks.push(format!("## {}\n", section.heading));
            blocks.extend(section.items.iter().map(|item| format!("- {item}\n")));
            if let Some(body) = &section.body {
                blocks.push(format!("{body}\n"));
            }
        }
        blocks
    }

    /// Section headings in document order.
    pub fn section_headings(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.heading.as_str()).collect()
    }

    /// List items of the `index`-th section (0-based). Empty for free-text
    /// sections and out-of-range indices.
    pub fn section_items(&self, index: usize) -> Vec<&str> {
        self.sections
            .get(index)
            .map(|s| s.items.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Verbatim body of the `index`-th section, if it is a free-text one.
    pub fn section_body(&self, index: usize) -> Option<&str> {
        self.sections.get(index)?.body.as_deref()
    }

    /// Blocks are joined with `\n`, so a heading and its first item are
    /// separated by a blank line.
    pub fn to_markdown(&self) -> String {
        self.blocks().join("\n")
    }
}

impl fmt::Display for MarkdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

/// Build the Markdown report for `result`.
pub fn to_markdown(result: &RoadmapResult, delimiter: &BulletDelimiter) -> MarkdownReport {
    let questionnaire = questionnaire_items(&result.questionnaire, delimiter)
        .into_iter()
        .map(str::to_string);
    let noc_codes = result.noc_codes.iter().map(|code| code.trim().to_string());

    MarkdownReport {
        title: REPORT_TITLE.to_string(),
        sections: vec![
            Section::list(SECTION_HEADINGS[0], questionnaire),
            Section::text(SECTION_HEADINGS[1], &result.job_roles),
            Section::list(SECTION_HEADINGS[2], noc_codes),
            Section::text(SECTION_HEADINGS[3], &result.crs_score),
            Section::text(SECTION_HEADINGS[4], &result.roadmap),
        ],
    }
}

/// Split the questionnaire on the bullet delimiter, dropping fragments that
/// are blank after trimming.
pub fn questionnaire_items<'a>(questionnaire: &'a str, delimiter: &BulletDelimiter) -> Vec<&'a str> {
    let glyph = delimiter.resolve(questionnaire);
    questionnaire
        .split(glyph)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
