//! Single-document conversion entry points.
//!
//! Every input kind ends up on the same path: PDF and DOCX are first turned
//! into HTML by the extractor, then HTML is parsed by the engine, filtered,
//! rendered to GFM and cleaned. Use [`crate::batch`] for whole directories.

use crate::config::ConversionConfig;
use crate::error::Docs2GfmError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::input::{self, InputKind};
use crate::pipeline::postprocess;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert an HTML, PDF or DOCX file to GitHub Flavored Markdown.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every failure is fatal for this document:
/// - source missing, unreadable, or of an unsupported kind
/// - source (or extractor output) not valid UTF-8
/// - engine or extractor not installed, exiting non-zero, or timing out
pub async fn convert(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docs2GfmError> {
    let total_start = Instant::now();
    let source = source.as_ref();
    info!("Starting conversion: {}", source.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(source)?;

    // ── Step 2: Obtain HTML ──────────────────────────────────────────────
    let extract_start = Instant::now();
    let html = if resolved.kind.needs_extraction() {
        config
            .resolve_extractor()
            .extract(&resolved.path, resolved.kind)
            .await?
    } else {
        input::read_utf8(&resolved.path).await?
    };
    let extract_duration_ms = if resolved.kind.needs_extraction() {
        extract_start.elapsed().as_millis() as u64
    } else {
        0
    };

    // ── Step 3: Parse → filter → render → clean ──────────────────────────
    let engine_start = Instant::now();
    let markdown = convert_html(&html, config).await?;
    let engine_duration_ms = engine_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        input_bytes: html.len(),
        output_bytes: markdown.len(),
        extract_duration_ms,
        engine_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Converted {} ({}, {} → {} bytes) in {}ms",
        source.display(),
        resolved.kind,
        stats.input_bytes,
        stats.output_bytes,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        kind: resolved.kind,
        stats,
    })
}

/// Run the HTML path on in-memory text.
pub async fn convert_html(html: &str, config: &ConversionConfig) -> Result<String, Docs2GfmError> {
    let engine = config.resolve_engine();

    let mut doc = engine.parse_html(html).await?;
    debug!("{} parsed {} top-level blocks", engine.name(), doc.blocks.len());

    config.filter_rules().apply(&mut doc);

    let raw = engine.render_gfm(&doc).await?;
    debug!("{} rendered {} bytes of GFM", engine.name(), raw.len());

    Ok(postprocess::clean_markdown(&raw, config.summary_style))
}

/// Convert a document and write the Markdown to `output_path`.
///
/// Parent directories are created. The file is written to a temporary
/// sibling and renamed into place, so a failed conversion never leaves a
/// partial file behind.
pub async fn convert_to_file(
    source: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Docs2GfmError> {
    let output = convert(source, config).await?;
    write_atomic(output_path.as_ref(), output.markdown).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docs2GfmError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Docs2GfmError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, config))
}

/// Convert document bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] named with the extension
/// of `kind`, which is removed when this function returns.
///
/// # Example
/// ```rust,no_run
/// use docs2gfm::{convert_from_bytes, ConversionConfig, InputKind};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("manual.html")?;
/// let output = convert_from_bytes(&bytes, InputKind::Html, &ConversionConfig::default()).await?;
/// println!("{}", output.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    kind: InputKind,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docs2GfmError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("docs2gfm-")
        .suffix(&format!(".{kind}"))
        .tempfile()
        .map_err(|e| Docs2GfmError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Docs2GfmError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(tmp.path(), config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Atomic write: temp file in the destination directory, then rename.
pub(crate) async fn write_atomic(path: &Path, contents: String) -> Result<(), Docs2GfmError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, contents.as_bytes()))
        .await
        .map_err(|e| Docs2GfmError::Internal(format!("write task failed: {e}")))?
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> Result<(), Docs2GfmError> {
    let fail = |source: std::io::Error| Docs2GfmError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
