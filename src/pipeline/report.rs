//! Report rendering: display panels and the downloadable PDF.
//!
//! The PDF writer understands the subset of Markdown the report actually
//! contains: ATX headings, `-`/`*`/`+` and numbered list items, thematic
//! breaks and plain paragraphs. Inline emphasis, code spans and links are
//! flattened to their text. Pages are A4 and use the standard Helvetica
//! fonts, so no font files are embedded; characters outside WinAnsi print
//! as `?`.
//!
//! Layout runs in `spawn_blocking` because it is CPU-bound and lopdf is
//! synchronous.

use crate::error::AssessError;
use crate::pipeline::roadmap::RoadmapResult;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name offered for the downloaded report.
pub const REPORT_FILE_NAME: &str = "immigration_assessment.pdf";

/// MIME type of the downloaded report.
pub const REPORT_MIME_TYPE: &str = "application/pdf";

// ── Panels ───────────────────────────────────────────────────────────────

/// One collapsible result section in the user interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPanel {
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Whether the panel starts open.
    pub expanded: bool,
}

/// The result panels in display order. The roadmap opens expanded; each NOC
/// code is followed by a horizontal rule.
pub fn panels(result: &RoadmapResult) -> Vec<ReportPanel> {
    let noc_body = result
        .noc_codes
        .iter()
        .map(|code| format!("{code}\n\n---\n"))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ReportPanel {
            title: "Roadmap".into(),
            body: result.roadmap.clone(),
            expanded: true,
        },
        ReportPanel {
            title: "CRS Score Details".into(),
            body: result.crs_score.clone(),
            expanded: false,
        },
        ReportPanel {
            title: "Eligible Job Roles".into(),
            body: result.job_roles.clone(),
            expanded: false,
        },
        ReportPanel {
            title: "NOC Codes".into(),
            body: noc_body,
            expanded: false,
        },
    ]
}

// ── PDF document ─────────────────────────────────────────────────────────

/// A rendered PDF report ready for download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub file_name: String,
    pub mime_type: String,
    pub page_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Render `markdown` to PDF off the async executor.
pub async fn render_pdf(markdown: &str) -> Result<ReportDocument, AssessError> {
    let markdown = markdown.to_string();
    tokio::task::spawn_blocking(move || render_pdf_blocking(&markdown))
        .await
        .map_err(|e| AssessError::Internal(format!("Render task panicked: {e}")))?
}

/// Blocking implementation of [`render_pdf`].
pub fn render_pdf_blocking(markdown: &str) -> Result<ReportDocument, AssessError> {
    let blocks = parse_blocks(markdown);
    let pages = layout(&blocks);
    let page_count = pages.len();
    let bytes = write_document(pages)?;
    debug!("Rendered report: {} pages, {} bytes", page_count, bytes.len());

    Ok(ReportDocument {
        file_name: REPORT_FILE_NAME.to_string(),
        mime_type: REPORT_MIME_TYPE.to_string(),
        page_count,
        bytes,
    })
}

// ── Markdown blocks ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading { level: usize, text: String },
    ListItem { indent: usize, marker: String, text: String },
    Rule,
    Paragraph(String),
    Blank,
}

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3}[.)])\s+(.*)$").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s][^*]*?)\*").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

fn parse_blocks(markdown: &str) -> Vec<Block> {
    markdown.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Block {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Block::Blank;
    }
    if is_rule(trimmed) {
        return Block::Rule;
    }

    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &trimmed[hashes..];
        if rest.is_empty() || rest.starts_with(' ') {
            return Block::Heading {
                level: hashes,
                text: flatten_inline(rest.trim().trim_end_matches('#').trim_end()),
            };
        }
    }

    let indent = (line.len() - line.trim_start().len()) / 2;
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(bullet) {
            return Block::ListItem {
                indent: indent.min(3),
                marker: "•".into(),
                text: flatten_inline(rest.trim()),
            };
        }
    }
    if let Some(caps) = RE_NUMBERED.captures(trimmed) {
        return Block::ListItem {
            indent: indent.min(3),
            marker: caps[1].to_string(),
            text: flatten_inline(caps[2].trim()),
        };
    }

    Block::Paragraph(flatten_inline(trimmed))
}

fn is_rule(s: &str) -> bool {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&m| compact.chars().all(|c| c == m))
}

/// Strip inline Markdown markup, keeping the visible text.
fn flatten_inline(text: &str) -> String {
    let s = RE_LINK.replace_all(text, "$1 ($2)");
    let s = RE_BOLD.replace_all(&s, "$1$2");
    let s = RE_ITALIC.replace_all(&s, "$1");
    let s = RE_CODE.replace_all(&s, "$1");
    s.into_owned()
}

// ── Layout ───────────────────────────────────────────────────────────────

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BODY_SIZE: f32 = 11.0;
const LEADING: f32 = 1.35;
const LIST_INDENT: f32 = 14.0;
const LIST_TEXT_OFFSET: f32 = 18.0;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Helvetica advance widths (1/1000 em) for bytes 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

fn glyph_width(b: u8) -> f32 {
    match b {
        0x20..=0x7E => HELVETICA_WIDTHS[(b - 0x20) as usize] as f32,
        _ => 556.0,
    }
}

/// Width of `text` in points. Bold is over-estimated slightly so wrapped
/// lines never overrun the margin.
fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let em: f32 = win_ansi(text).into_iter().map(glyph_width).sum();
    let factor = match font {
        Font::Regular => 1.0,
        Font::Bold => 1.08,
    };
    em / 1000.0 * size * factor
}

/// Greedy word wrap. Words wider than the line are broken by character.
fn wrap(text: &str, max_width: f32, size: f32, font: Font) -> Vec<String> {
    let measure = |s: &str| text_width(s, size, font);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() {
            if measure(&line) + measure(" ") + measure(word) <= max_width {
                line.push(' ');
                line.push_str(word);
                continue;
            }
            lines.push(std::mem::take(&mut line));
        }
        if measure(word) <= max_width {
            line.push_str(word);
            continue;
        }
        for ch in word.chars() {
            let mut buf = [0u8; 4];
            if !line.is_empty() && measure(&line) + measure(ch.encode_utf8(&mut buf)) > max_width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Map text to WinAnsiEncoding bytes.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\t' => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' | '●' | '▪' | '◦' | '\u{F0B7}' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

/// Accumulates content-stream operations page by page.
struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn at_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` more points fit on this one.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN && !self.at_top() {
            self.break_page();
        }
    }

    fn skip(&mut self, height: f32) {
        if !self.at_top() {
            self.y -= height;
        }
    }

    fn text_line(&mut self, font: Font, size: f32, x: f32, text: &str) {
        let line_height = size * LEADING;
        self.reserve(line_height);
        let baseline = self.y - size;
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
        self.y -= line_height;
    }

    fn rule(&mut self) {
        self.reserve(12.0);
        self.y -= 6.0;
        let y = self.y;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("G", vec![0.6f32.into()]),
            Operation::new("w", vec![0.75f32.into()]),
            Operation::new("m", vec![MARGIN.into(), y.into()]),
            Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self.y -= 6.0;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn heading_size(level: usize) -> f32 {
    match level {
        1 => 20.0,
        2 => 15.0,
        3 => 13.0,
        _ => 12.0,
    }
}

fn layout(blocks: &[Block]) -> Vec<Vec<Operation>> {
    let mut page = Layout::new();

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = heading_size(*level);
                page.skip(size * 0.5);
                for line in wrap(text, CONTENT_WIDTH, size, Font::Bold) {
                    page.text_line(Font::Bold, size, MARGIN, &line);
                }
            }
            Block::ListItem {
                indent,
                marker,
                text,
            } => {
                let x = MARGIN + *indent as f32 * LIST_INDENT;
                let width = CONTENT_WIDTH - (x - MARGIN) - LIST_TEXT_OFFSET;
                let lines = wrap(text, width, BODY_SIZE, Font::Regular);
                for (i, line) in lines.iter().enumerate() {
                    if i == 0 {
                        // Marker and first line share a baseline.
                        page.reserve(BODY_SIZE * LEADING);
                        let y = page.y;
                        page.text_line(Font::Regular, BODY_SIZE, x + 4.0, marker);
                        page.y = y;
                    }
                    page.text_line(Font::Regular, BODY_SIZE, x + LIST_TEXT_OFFSET, line);
                }
            }
            Block::Rule => page.rule(),
            Block::Paragraph(text) => {
                for line in wrap(text, CONTENT_WIDTH, BODY_SIZE, Font::Regular) {
                    page.text_line(Font::Regular, BODY_SIZE, MARGIN, &line);
                }
            }
            Block::Blank => page.skip(BODY_SIZE * 0.5),
        }
    }

    page.finish()
}

// ── Serialisation ────────────────────────────────────────────────────────

fn write_document(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, AssessError> {
    let render_err = |e: lopdf::Error| AssessError::ReportRenderFailed(e.to_string());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }.encode().map_err(render_err)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(crate::pipeline::markdown::REPORT_TITLE),
        "Producer" => Object::string_literal(concat!("immigration-roadmap ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| AssessError::ReportRenderFailed(e.to_string()))?;
    Ok(buf)
}
