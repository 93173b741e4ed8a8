//! Configuration types for documentation-to-GFM conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across concurrent jobs and to log exactly what
//! a run was configured with.
//!
//! # Design choice: builder over constructor
//! Most callers only change the pandoc path or the concurrency; the builder
//! lets them set just that and rely on documented defaults for the rest.

use crate::error::Docs2GfmError;
use crate::pipeline::engine::{MarkupEngine, PandocEngine};
use crate::pipeline::extract::{CommandExtractor, DocumentExtractor, ExtractorCommand};
use crate::pipeline::filter::{FilterRules, DEFAULT_SENTINEL_IMAGE};
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

pub use crate::pipeline::tables::SummaryStyle;

/// Configuration for a conversion (single file or batch).
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use docs2gfm::{ConversionConfig, SummaryStyle};
///
/// let config = ConversionConfig::builder()
///     .pandoc_path("/usr/local/bin/pandoc")
///     .concurrency(8)
///     .summary_style(SummaryStyle::BoldLabel)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Path or name of the pandoc executable. Default: `"pandoc"` (looked up on `PATH`).
    pub pandoc_path: String,

    /// Upper bound on each external process invocation, in seconds. Default: 60.
    ///
    /// Applies separately to the parse call, the render call and any
    /// extraction call. On expiry the child is killed and the job fails with
    /// [`Docs2GfmError::EngineTimeout`].
    pub engine_timeout_secs: u64,

    /// Number of files converted at once in batch mode. Default: 4.
    ///
    /// Each job spawns at most one external process at a time, so this is
    /// also the cap on concurrent pandoc processes.
    pub concurrency: usize,

    /// Canonical form for summary tables. Default: [`SummaryStyle::FieldTable`].
    pub summary_style: SummaryStyle,

    /// Image sources removed from the document tree.
    /// Default: `["image/background_index.png"]`.
    pub sentinel_images: Vec<String>,

    /// Command turning a PDF into HTML. Default: `pdftohtml`.
    pub pdf_extractor: ExtractorCommand,

    /// Command turning a DOCX into HTML. Default: pandoc's DOCX reader.
    pub docx_extractor: ExtractorCommand,

    /// Pre-constructed engine. Takes precedence over `pandoc_path`.
    pub engine: Option<Arc<dyn MarkupEngine>>,

    /// Pre-constructed extractor. Takes precedence over `pdf_extractor` and
    /// `docx_extractor`.
    pub extractor: Option<Arc<dyn DocumentExtractor>>,

    /// Optional callback for per-file batch events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pandoc_path: "pandoc".to_string(),
            engine_timeout_secs: 60,
            concurrency: 4,
            summary_style: SummaryStyle::default(),
            sentinel_images: vec![DEFAULT_SENTINEL_IMAGE.to_string()],
            pdf_extractor: ExtractorCommand::pdftohtml(),
            docx_extractor: ExtractorCommand::pandoc_docx("pandoc"),
            engine: None,
            extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pandoc_path", &self.pandoc_path)
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("summary_style", &self.summary_style)
            .field("sentinel_images", &self.sentinel_images)
            .field("pdf_extractor", &self.pdf_extractor)
            .field("docx_extractor", &self.docx_extractor)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn DocumentExtractor>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
            docx_extractor_set: false,
        }
    }

    /// The filter rule set this configuration implies.
    pub fn filter_rules(&self) -> FilterRules {
        FilterRules::new(self.sentinel_images.clone())
    }

    /// The injected engine, or pandoc at `pandoc_path`.
    pub fn resolve_engine(&self) -> Arc<dyn MarkupEngine> {
        match &self.engine {
            Some(engine) => Arc::clone(engine),
            None => Arc::new(PandocEngine::new(
                self.pandoc_path.clone(),
                self.engine_timeout_secs,
            )),
        }
    }

    /// The injected extractor, or the configured extractor commands.
    pub fn resolve_extractor(&self) -> Arc<dyn DocumentExtractor> {
        match &self.extractor {
            Some(extractor) => Arc::clone(extractor),
            None => Arc::new(CommandExtractor::new(
                self.pdf_extractor.clone(),
                self.docx_extractor.clone(),
                self.engine_timeout_secs,
            )),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
    docx_extractor_set: bool,
}

impl ConversionConfigBuilder {
    /// Also becomes the DOCX extractor's program unless one was set explicitly.
    pub fn pandoc_path(mut self, path: impl Into<String>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn summary_style(mut self, style: SummaryStyle) -> Self {
        self.config.summary_style = style;
        self
    }

    /// Replace the sentinel image list.
    pub fn sentinel_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sentinel_images = images.into_iter().map(Into::into).collect();
        self
    }

    /// Add one more sentinel image source.
    pub fn sentinel_image(mut self, src: impl Into<String>) -> Self {
        let src = src.into();
        if !self.config.sentinel_images.contains(&src) {
            self.config.sentinel_images.push(src);
        }
        self
    }

    pub fn pdf_extractor(mut self, command: ExtractorCommand) -> Self {
        self.config.pdf_extractor = command;
        self
    }

    pub fn docx_extractor(mut self, command: ExtractorCommand) -> Self {
        self.config.docx_extractor = command;
        self.docx_extractor_set = true;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn MarkupEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ConversionConfig, Docs2GfmError> {
        let c = &self.config;
        if c.pandoc_path.trim().is_empty() {
            return Err(Docs2GfmError::InvalidConfig(
                "pandoc path must not be empty".into(),
            ));
        }
        if c.engine_timeout_secs == 0 {
            return Err(Docs2GfmError::InvalidConfig(
                "Engine timeout must be ≥ 1 second".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Docs2GfmError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.pdf_extractor.program.trim().is_empty() || c.docx_extractor.program.trim().is_empty() {
            return Err(Docs2GfmError::InvalidConfig(
                "extractor program must not be empty".into(),
            ));
        }
        if !self.docx_extractor_set {
            self.config.docx_extractor = ExtractorCommand::pandoc_docx(&self.config.pandoc_path);
        }
        Ok(self.config)
    }
}
