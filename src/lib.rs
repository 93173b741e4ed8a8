//! # docs2gfm
//!
//! Convert documentation (HTML manuals, PDF and DOCX) to clean, canonical
//! GitHub Flavored Markdown.
//!
//! ## Why this crate?
//!
//! Pandoc already converts HTML to GFM, but documentation exported from
//! DocBook-style toolchains comes out noisy: wrapper `<div>`s everywhere,
//! command synopses as nested spans, links still pointing at `.html` pages,
//! decorative background images and summary tables with empty headers. This
//! crate drives pandoc, rewrites its document tree in between, and finishes
//! with a deterministic text cleanup so re-running over the same input never
//! produces a diff.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML / PDF / DOCX
//!  │
//!  ├─ 1. Input    classify by extension, decode strict UTF-8
//!  ├─ 2. Extract  PDF/DOCX only: pdftohtml / pandoc → HTML
//!  ├─ 3. Parse    pandoc --from=html --to=json
//!  ├─ 4. Filter   unwrap divs/spans, flatten synopses, rewrite links, drop sentinels
//!  ├─ 5. Render   pandoc --from=json --to=gfm --wrap=none
//!  └─ 6. Clean    summary tables, code fences, whitespace, character table
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docs2gfm::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("manual/setup.html", &config).await?;
//!     println!("{}", output.markdown);
//!     Ok(())
//! }
//! ```
//!
//! Whole trees go through [`convert_dir`], which mirrors the directory
//! layout and reports per-file failures without stopping.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docs2gfm` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docs2gfm = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! | Tool | Needed for |
//! |------|------------|
//! | `pandoc` | every conversion |
//! | `pdftohtml` (poppler) | PDF input only |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_dir, convert_dir_stream, discover_jobs, ConversionJob, JobStream};
pub use config::{ConversionConfig, ConversionConfigBuilder, SummaryStyle};
pub use convert::{convert, convert_from_bytes, convert_html, convert_sync, convert_to_file};
pub use error::{Docs2GfmError, ErrorCategory, JobError};
pub use output::{BatchReport, ConversionOutput, ConversionStats, JobResult};
pub use pipeline::ast::PandocDocument;
pub use pipeline::engine::{MarkupEngine, PandocEngine};
pub use pipeline::extract::{CommandExtractor, DocumentExtractor, ExtractorCommand};
pub use pipeline::filter::FilterRules;
pub use pipeline::input::{resolve_output, InputKind};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
