//! CLI binary for docs2gfm.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docs2gfm::pipeline::filter::DEFAULT_SENTINEL_IMAGE;
use docs2gfm::{
    convert, convert_dir, convert_to_file, resolve_output, ConversionConfig,
    ConversionProgressCallback, ProgressCallback, SummaryStyle,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for batch runs: a live bar plus one log line
/// per finished file. Jobs finish out of order, so timings are keyed by job.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports the job count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_jobs: usize) {
        self.activate_bar(total_jobs);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_jobs} files…"))
        ));
    }

    fn on_job_start(&self, index: usize, _total: usize, path: &Path) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(path.display().to_string());
    }

    fn on_job_complete(&self, index: usize, _total: usize, path: &Path, markdown_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:<48}  {:<8}  {}",
            green("✓"),
            path.display(),
            dim(&format!("{markdown_len:>6} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_job_error(&self, index: usize, _total: usize, path: &Path, error: &str) {
        let secs = self.elapsed_secs(index);

        // First line only, truncated, to keep the log tidy.
        let first = error.lines().next().unwrap_or(error);
        let msg = if first.chars().count() > 80 {
            format!("{}\u{2026}", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };

        self.bar.println(format!(
            "  {} {:<48}  {}  {}",
            red("✗"),
            path.display(),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_jobs: usize, success_count: usize) {
        let failed = total_jobs.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_jobs { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_jobs,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one page next to its source (writes setup.md)
  docs2gfm manual/setup.html

  # Print to stdout
  docs2gfm manual/setup.html --stdout

  # Convert a whole manual tree, 8 files at a time
  docs2gfm manual/ -o docs/ -c 8

  # PDF and DOCX go through the same pipeline
  docs2gfm guide.pdf -o guide.md
  docs2gfm notes.docx -o notes.md

  # Summaries as bold-label paragraphs instead of tables
  docs2gfm manual/ -o docs/ --summary-style bold-label

  # Machine-readable report
  docs2gfm manual/ -o docs/ --json > report.json

EXTERNAL TOOLS:
  pandoc      required for every conversion (--pandoc to override the path)
  pdftohtml   required for PDF input (poppler-utils)

ENVIRONMENT VARIABLES:
  Every flag can be set with DOCS2GFM_<FLAG>, e.g. DOCS2GFM_PANDOC,
  DOCS2GFM_CONCURRENCY, DOCS2GFM_SUMMARY_STYLE.
  RUST_LOG overrides the log filter (e.g. RUST_LOG=docs2gfm=debug).
"#;

/// Convert HTML, PDF and DOCX documentation to GitHub Flavored Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "docs2gfm",
    version,
    about = "Convert HTML, PDF and DOCX documentation to GitHub Flavored Markdown",
    long_about = "Convert documentation to clean, canonical GitHub Flavored Markdown. \
HTML is parsed by pandoc, rewritten (wrapper divs removed, command synopses turned into code \
blocks, .html links pointed at .md) and normalised (summary tables, code fences, whitespace). \
PDF and DOCX are converted to HTML first and follow the same path. A directory input converts \
every supported file under it, mirroring the layout into the output directory.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source file (.html, .htm, .pdf, .docx) or directory.
    input: PathBuf,

    /// Output file or directory. Default: the input with a .md extension.
    #[arg(short, long, env = "DOCS2GFM_OUTPUT")]
    output: Option<PathBuf>,

    /// Print Markdown to stdout instead of writing a file (single file only).
    #[arg(long, env = "DOCS2GFM_STDOUT", conflicts_with = "output")]
    stdout: bool,

    /// pandoc executable.
    #[arg(long, env = "DOCS2GFM_PANDOC", default_value = "pandoc")]
    pandoc: String,

    /// Per-process timeout in seconds for pandoc and the extractors.
    #[arg(long, env = "DOCS2GFM_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Files converted at once in directory mode.
    #[arg(short, long, env = "DOCS2GFM_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// How summary tables are rewritten.
    #[arg(long, env = "DOCS2GFM_SUMMARY_STYLE", value_enum, default_value = "field-table")]
    summary_style: SummaryStyleArg,

    /// Extra image source to drop from the output (repeatable).
    #[arg(long = "drop-image", env = "DOCS2GFM_DROP_IMAGE", value_delimiter = ',')]
    drop_images: Vec<String>,

    /// Image source to keep even though it is dropped by default (repeatable).
    #[arg(long = "keep-image", env = "DOCS2GFM_KEEP_IMAGE", value_delimiter = ',')]
    keep_images: Vec<String>,

    /// Output JSON (ConversionOutput or BatchReport) on stdout.
    #[arg(long, env = "DOCS2GFM_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCS2GFM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCS2GFM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCS2GFM_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SummaryStyleArg {
    FieldTable,
    BoldLabel,
}

impl From<SummaryStyleArg> for SummaryStyle {
    fn from(v: SummaryStyleArg) -> Self {
        match v {
            SummaryStyleArg::FieldTable => SummaryStyle::FieldTable,
            SummaryStyleArg::BoldLabel => SummaryStyle::BoldLabel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let batch = cli.input.is_dir();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    if batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config).await
    }
}

async fn run_single(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    if cli.stdout || cli.json {
        let output = convert(&cli.input, config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.markdown.as_bytes())
                .context("Failed to write to stdout")?;
        }
        return Ok(());
    }

    let output_path = resolve_output(&cli.input, cli.output.as_deref())?;
    let stats = convert_to_file(&cli.input, &output_path, config)
        .await
        .context("Conversion failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            green("✔"),
            stats.output_bytes,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }
    Ok(())
}

async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let output_dir = resolve_output(&cli.input, cli.output.as_deref())?;
    let report = convert_dir(&cli.input, &output_dir, config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && config.progress_callback.is_none() {
        // Without the bar, failures have only been logged; list them here.
        for err in report.errors() {
            eprintln!("  {} {}", red("✗"), err);
        }
        eprintln!(
            "Converted {}/{} files in {}ms",
            report.succeeded, report.total, report.total_duration_ms
        );
    }

    if !report.is_success() {
        anyhow::bail!("{} of {} files failed to convert", report.failed, report.total);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut sentinels = vec![DEFAULT_SENTINEL_IMAGE.to_string()];
    for src in &cli.drop_images {
        if !sentinels.contains(src) {
            sentinels.push(src.clone());
        }
    }
    sentinels.retain(|s| !cli.keep_images.contains(s));

    let mut builder = ConversionConfig::builder()
        .pandoc_path(&cli.pandoc)
        .engine_timeout_secs(cli.timeout)
        .concurrency(cli.concurrency)
        .summary_style(cli.summary_style.into())
        .sentinel_images(sentinels);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
