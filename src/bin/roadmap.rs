//! CLI binary for immigration-roadmap.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AssessmentConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use immigration_roadmap::pipeline::input::resolve_input;
use immigration_roadmap::pipeline::report::REPORT_FILE_NAME;
use immigration_roadmap::{
    assess, assess_to_file, extract_text, AssessmentConfig, AssessmentObserver,
    AssessmentOutput, BulletDelimiter, ExtractionSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner that follows the request through its stages and prints warnings
/// and errors above itself as they arrive.
#[derive(Debug)]
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl AssessmentObserver for CliObserver {
    fn on_extraction_start(&self, name: &str, bytes: usize) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message("Extracting text from PDF...");
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(name),
            dim(&format!("{bytes} bytes"))
        ));
    }

    fn on_warning(&self, message: &str) {
        self.bar.println(format!("  {} {}", yellow("⚠"), yellow(message)));
    }

    fn on_error(&self, message: &str) {
        self.bar.println(format!("  {} {}", red("✗"), red(message)));
    }

    fn on_extraction_complete(&self, source: ExtractionSource, chars: usize) {
        if let Some(line) = extraction_summary(source, chars) {
            self.bar.println(line);
        }
    }

    fn on_roadmap_start(&self) {
        self.bar.set_prefix("Roadmap");
        self.bar.set_message("Processing...");
    }

    fn on_roadmap_complete(&self) {
        self.bar.println(format!("  {} Roadmap generated", green("✓")));
        self.bar.set_prefix("Rendering");
        self.bar.set_message("Building report…");
    }

    fn on_report_ready(&self, pages: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} Report rendered  {}",
            green("✓"),
            dim(&format!("{pages} pages, {bytes} bytes"))
        ));
    }
}

/// Success line for a finished extraction. Nothing is printed when no text
/// came back; the warning or error already explains why.
fn extraction_summary(source: ExtractionSource, chars: usize) -> Option<String> {
    if chars == 0 {
        return None;
    }
    let label = match source {
        ExtractionSource::Ocr => "OCR",
        ExtractionSource::LocalFallback => "local fallback",
        ExtractionSource::Unavailable => "unavailable",
    };
    Some(format!(
        "  {} Text extracted  {}",
        green("✓"),
        dim(&format!("{chars} chars via {label}"))
    ))
}

const AFTER_HELP: &str = r#"HOW TO USE:
  1. Fill in the immigration questionnaire and save it as a PDF.
  2. Run `roadmap questionnaire.pdf`.
  3. Wait while the text is extracted and your roadmap is generated.
  4. Read the roadmap, CRS score, job roles and NOC codes printed below
     the extracted-text preview.
  5. Open immigration_assessment.pdf for the full report.

EXAMPLES:
  # Assess a questionnaire, write immigration_assessment.pdf
  roadmap questionnaire.pdf

  # Choose the report file and also keep the Markdown
  roadmap questionnaire.pdf -o report.pdf --markdown report.md

  # Only show what the extractor reads from the PDF
  roadmap --extract-only questionnaire.pdf

  # Structured JSON, no PDF
  roadmap --json --no-pdf questionnaire.pdf > assessment.json

  # Questionnaire answers separated by another bullet glyph
  roadmap --delimiter auto questionnaire.pdf

  # From a URL
  roadmap https://example.com/questionnaire.pdf

ENVIRONMENT VARIABLES:
  RAPIDAPI_KEY       OCR service key (required)
  OCR_API_URL        Override the OCR endpoint
  OCR_API_HOST       Override the X-RapidAPI-Host header
  ROADMAP_API_URL    Override the roadmap endpoint
  RUST_LOG           Tracing filter, e.g. immigration_roadmap=debug

NOTES:
  If the OCR service is unavailable the PDF's own text layer is used and a
  warning is printed. Scanned questionnaires without a text layer then
  produce an empty questionnaire.
"#;

/// Generate a Canadian immigration assessment from a questionnaire PDF.
#[derive(Parser, Debug)]
#[command(
    name = "roadmap",
    version,
    about = "Generate a Canadian immigration assessment from a questionnaire PDF",
    long_about = "Extract the answers from a filled-in immigration questionnaire (PDF), send \
them to the roadmap service and produce a report with your immigration roadmap, CRS score \
breakdown, eligible job roles and NOC codes.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// OCR service API key.
    #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write the PDF report to this file.
    #[arg(short, long, env = "ROADMAP_OUTPUT", default_value = REPORT_FILE_NAME)]
    output: PathBuf,

    /// Also write the Markdown report to this file.
    #[arg(long, env = "ROADMAP_MARKDOWN")]
    markdown: Option<PathBuf>,

    /// Output structured JSON (AssessmentOutput) instead of panels.
    #[arg(long, env = "ROADMAP_JSON")]
    json: bool,

    /// Only extract and preview the questionnaire text.
    #[arg(long)]
    extract_only: bool,

    /// Do not render the PDF report.
    #[arg(long, env = "ROADMAP_NO_PDF")]
    no_pdf: bool,

    /// Questionnaire answer delimiter: a glyph, or `auto` to detect.
    #[arg(long, env = "ROADMAP_DELIMITER", default_value = "●")]
    delimiter: String,

    /// OCR endpoint.
    #[arg(long, env = "OCR_API_URL")]
    ocr_url: Option<String>,

    /// OCR `X-RapidAPI-Host` header.
    #[arg(long, env = "OCR_API_HOST")]
    ocr_host: Option<String>,

    /// Roadmap endpoint.
    #[arg(long, env = "ROADMAP_API_URL")]
    roadmap_url: Option<String>,

    /// OCR call timeout in seconds.
    #[arg(long, env = "ROADMAP_OCR_TIMEOUT", default_value_t = 60)]
    ocr_timeout: u64,

    /// Roadmap call timeout in seconds.
    #[arg(long, env = "ROADMAP_API_TIMEOUT", default_value_t = 120)]
    roadmap_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "ROADMAP_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Characters of extracted text to preview.
    #[arg(long, default_value_t = 500)]
    preview_chars: usize,

    /// Disable the progress spinner.
    #[arg(long, env = "ROADMAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ROADMAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "ROADMAP_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; warnings still reach the user through
    // the observer.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    // Fails on a missing key before any input is touched or the spinner
    // is drawn.
    let (config, observer) = prepare(&cli, show_progress)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let document = resolve_input(&cli.input, config.download_timeout_secs)
            .await
            .context("Failed to read input")?;
        let extraction = extract_text(&document, &config)
            .await
            .context("Extraction failed")?;
        if let Some(ref o) = observer {
            o.finish();
        }

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&extraction)
                    .context("Failed to serialise extraction")?
            );
        } else {
            print_preview(&extraction.into_text().preview(config.preview_chars));
        }
        return Ok(());
    }

    // ── Run assessment ───────────────────────────────────────────────────
    let result = if cli.no_pdf {
        assess(&cli.input, &config).await
    } else {
        assess_to_file(&cli.input, &cli.output, &config).await
    };
    if let Some(ref o) = observer {
        o.finish();
    }
    let output = result.context("Assessment failed")?;

    if let Some(ref path) = cli.markdown {
        tokio::fs::write(path, output.markdown.to_markdown())
            .await
            .with_context(|| format!("Failed to write Markdown to {}", path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    print_preview(&output.text_preview(config.preview_chars));
    print_panels(&output);

    if !cli.quiet {
        if let Some(ref path) = cli.markdown {
            eprintln!("{}  Markdown  →  {}", green("✔"), bold(&path.display().to_string()));
        }
        if !cli.no_pdf {
            eprintln!(
                "{}  Report    →  {}  {}",
                green("✔"),
                bold(&cli.output.display().to_string()),
                dim(&format!("{}ms total", output.stats.total_duration_ms)),
            );
        }
    }

    Ok(())
}

/// Validate the config, then start the spinner and attach it.
fn prepare(
    cli: &Cli,
    show_progress: bool,
) -> Result<(AssessmentConfig, Option<Arc<CliObserver>>)> {
    let mut config = build_config(cli)?;
    let observer = show_progress.then(CliObserver::new);
    config.observer = observer
        .clone()
        .map(|o| o as Arc<dyn AssessmentObserver>);
    Ok((config, observer))
}

/// Map CLI args to `AssessmentConfig`.
fn build_config(cli: &Cli) -> Result<AssessmentConfig> {
    let mut builder = AssessmentConfig::builder()
        .delimiter(BulletDelimiter::from_arg(&cli.delimiter))
        .ocr_timeout_secs(cli.ocr_timeout)
        .roadmap_timeout_secs(cli.roadmap_timeout)
        .download_timeout_secs(cli.download_timeout)
        .preview_chars(cli.preview_chars)
        .render_report(!cli.no_pdf);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = cli.ocr_url {
        builder = builder.ocr_url(url);
    }
    if let Some(ref host) = cli.ocr_host {
        builder = builder.ocr_host(host);
    }
    if let Some(ref url) = cli.roadmap_url {
        builder = builder.roadmap_url(url);
    }
    builder.build().context("Invalid configuration")
}

fn print_preview(preview: &str) {
    println!("{}", bold("Extracted Text Preview"));
    if preview.is_empty() {
        println!("{}", dim("(no text extracted)"));
    } else {
        println!("{preview}");
    }
    println!();
}

fn print_panels(output: &AssessmentOutput) {
    for panel in output.panels() {
        let marker = if panel.expanded { "▼" } else { "▶" };
        println!("{} {}", cyan(marker), bold(&panel.title));
        println!();
        let body = panel.body.trim_end();
        if body.is_empty() {
            println!("{}", dim("(empty)"));
        } else {
            println!("{body}");
        }
        println!();
    }
}
