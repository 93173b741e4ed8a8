//! Document extraction: turn a PDF or DOCX file into HTML text.
//!
//! Extraction only has to get the document into *some* HTML; the output then
//! goes through exactly the same parse → filter → render → clean path as a
//! native HTML manual, so PDF, DOCX and HTML share one normalisation codepath.
//!
//! Defaults:
//!
//! | Kind | Command |
//! |------|---------|
//! | PDF  | `pdftohtml -stdout -noframes -i -enc UTF-8 {input}` |
//! | DOCX | `pandoc --from=docx --to=html {input}` |

use super::engine::run_command;
use super::input::InputKind;
use crate::error::Docs2GfmError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Placeholder replaced by the source path in [`ExtractorCommand::args`].
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Converts a non-HTML source file into HTML text.
pub trait DocumentExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        path: &'a Path,
        kind: InputKind,
    ) -> BoxFuture<'a, Result<String, Docs2GfmError>>;
}

/// An external command that writes HTML for `{input}` to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExtractorCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Poppler's `pdftohtml`, single page stream, images ignored.
    pub fn pdftohtml() -> Self {
        Self::new(
            "pdftohtml",
            ["-stdout", "-noframes", "-i", "-enc", "UTF-8", INPUT_PLACEHOLDER],
        )
    }

    /// pandoc's own DOCX reader.
    pub fn pandoc_docx(pandoc: &str) -> Self {
        Self::new(pandoc, ["--from=docx", "--to=html", INPUT_PLACEHOLDER])
    }

    /// Substitute the source path; appended when no placeholder is present.
    pub fn args_for(&self, input: &Path) -> Vec<String> {
        let input = input.display().to_string();
        if self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            self.args
                .iter()
                .map(|a| a.replace(INPUT_PLACEHOLDER, &input))
                .collect()
        } else {
            let mut args = self.args.clone();
            args.push(input);
            args
        }
    }
}

/// [`DocumentExtractor`] that shells out to one command per input kind.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    pdf: ExtractorCommand,
    docx: ExtractorCommand,
    timeout_secs: u64,
}

impl CommandExtractor {
    pub fn new(pdf: ExtractorCommand, docx: ExtractorCommand, timeout_secs: u64) -> Self {
        Self {
            pdf,
            docx,
            timeout_secs,
        }
    }

    fn command_for(&self, kind: InputKind) -> Option<&ExtractorCommand> {
        match kind {
            InputKind::Pdf => Some(&self.pdf),
            InputKind::Docx => Some(&self.docx),
            InputKind::Html => None,
        }
    }
}

impl DocumentExtractor for CommandExtractor {
    fn extract<'a>(
        &'a self,
        path: &'a Path,
        kind: InputKind,
    ) -> BoxFuture<'a, Result<String, Docs2GfmError>> {
        Box::pin(async move {
            let command = self.command_for(kind).ok_or_else(|| Docs2GfmError::InvalidInput {
                path: path.to_path_buf(),
                reason: format!("{kind} input needs no extraction"),
            })?;
            let args = command.args_for(path);
            debug!("Extracting {} via {}", path.display(), command.program);

            run_command(&command.program, args.as_slice(), None, self.timeout_secs)
                .await
                .map_err(|e| match e {
                    Docs2GfmError::InvalidUtf8 { .. } => e,
                    other => Docs2GfmError::ExtractionFailed {
                        path: path.to_path_buf(),
                        detail: other.to_string(),
                    },
                })
        })
    }
}
