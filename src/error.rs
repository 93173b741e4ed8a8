//! Error types for the docs2gfm library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Docs2GfmError`] — **Fatal** for one conversion: the source is missing,
//!   the engine is not installed, the bytes are not UTF-8. Returned as
//!   `Err(Docs2GfmError)` from the `convert*` functions.
//!
//! * [`JobError`] — **Non-fatal** for a batch: one file failed but its
//!   siblings are fine. Stored inside [`crate::output::JobResult`] so a
//!   directory run reports every failure instead of stopping at the first.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docs2gfm library.
#[derive(Debug, Error)]
pub enum Docs2GfmError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of .html, .htm, .pdf, .docx.
    #[error("Unsupported input '{path}': expected .html, .htm, .pdf or .docx")]
    UnsupportedInput { path: PathBuf },

    /// Input/output combination is invalid (e.g. directory input without a directory output).
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    // ── Encoding errors ───────────────────────────────────────────────────
    /// Source or engine output is not valid UTF-8.
    #[error("'{origin}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        origin: String,
        #[source]
        source: std::str::Utf8Error,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The external program could not be started because it is not installed.
    #[error("'{program}' was not found.\nInstall it or point --pandoc at the binary.")]
    EngineNotFound { program: String },

    /// The external program exited with a non-zero status.
    #[error("'{program}' exited with {status}:\n{stderr}")]
    EngineFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The external program did not finish within the configured bound.
    #[error("'{program}' timed out after {secs}s\nIncrease --timeout.")]
    EngineTimeout { program: String, secs: u64 },

    /// The engine succeeded but returned something we could not parse.
    #[error("Unexpected engine output: {detail}")]
    EngineOutput { detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The PDF/DOCX extractor failed for this file.
    #[error("Failed to extract text from '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`Docs2GfmError`], used in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    Encoding,
    Engine,
    Output,
    Internal,
}

impl Docs2GfmError {
    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Docs2GfmError::FileNotFound { .. }
            | Docs2GfmError::PermissionDenied { .. }
            | Docs2GfmError::UnsupportedInput { .. }
            | Docs2GfmError::InvalidInput { .. } => ErrorCategory::Input,
            Docs2GfmError::InvalidUtf8 { .. } => ErrorCategory::Encoding,
            Docs2GfmError::EngineNotFound { .. }
            | Docs2GfmError::EngineFailed { .. }
            | Docs2GfmError::EngineTimeout { .. }
            | Docs2GfmError::EngineOutput { .. }
            | Docs2GfmError::ExtractionFailed { .. } => ErrorCategory::Engine,
            Docs2GfmError::OutputWriteFailed { .. } => ErrorCategory::Output,
            Docs2GfmError::InvalidConfig(_) | Docs2GfmError::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// A non-fatal error for a single job of a batch run.
///
/// Stored in [`crate::output::JobResult`] when a file fails. The batch keeps
/// going; the failure is counted in [`crate::output::BatchReport`].
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}: {message}", .path.display())]
pub struct JobError {
    pub path: PathBuf,
    pub category: ErrorCategory,
    pub message: String,
}

impl JobError {
    /// Record a fatal conversion error against the job's source path.
    pub fn from_fatal(path: impl Into<PathBuf>, err: &Docs2GfmError) -> Self {
        Self {
            path: path.into(),
            category: err.category(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failed_display_carries_stderr() {
        let e = Docs2GfmError::EngineFailed {
            program: "pandoc".into(),
            status: "exit status: 64".into(),
            stderr: "Unknown input format".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pandoc"), "got: {msg}");
        assert!(msg.contains("Unknown input format"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = Docs2GfmError::EngineTimeout {
            program: "pandoc".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn categories_follow_taxonomy() {
        let missing = Docs2GfmError::FileNotFound {
            path: "a.html".into(),
        };
        assert_eq!(missing.category(), ErrorCategory::Input);

        let engine = Docs2GfmError::EngineNotFound {
            program: "pandoc".into(),
        };
        assert_eq!(engine.category(), ErrorCategory::Engine);

        let bad = std::str::from_utf8(&[0xff, 0xfe]).unwrap_err();
        let enc = Docs2GfmError::InvalidUtf8 {
            origin: "a.html".into(),
            source: bad,
        };
        assert_eq!(enc.category(), ErrorCategory::Encoding);
    }

    #[test]
    fn job_error_keeps_path_and_message() {
        let fatal = Docs2GfmError::UnsupportedInput {
            path: "notes.txt".into(),
        };
        let job = JobError::from_fatal("docs/notes.txt", &fatal);
        assert_eq!(job.category, ErrorCategory::Input);
        assert!(job.to_string().starts_with("docs/notes.txt:"));
        assert!(job.message.contains("Unsupported input"));
    }
}
