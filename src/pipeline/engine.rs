//! The generic markup engine: HTML in, JSON document tree out, and back to GFM.
//!
//! The engine is an external program (pandoc) driven as two subprocess calls,
//! with the filter rules running in-process on the JSON tree in between:
//!
//! ```text
//! html ──▶ pandoc --from=html --to=json ──▶ FilterRules ──▶ pandoc --from=json --to=gfm --wrap=none
//! ```
//!
//! [`MarkupEngine`] is the seam: the pipeline only talks to the trait, so
//! tests (and callers with their own engine) can inject an in-process
//! implementation through [`crate::config::ConversionConfigBuilder::engine`].
//!
//! Every subprocess runs to completion under a bounded wait; on expiry the
//! child is killed and the call fails with [`Docs2GfmError::EngineTimeout`].

use super::ast::PandocDocument;
use super::input::decode_utf8;
use crate::error::Docs2GfmError;
use futures::future::BoxFuture;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Parses HTML into a document tree and serialises a tree to GFM.
pub trait MarkupEngine: Send + Sync {
    /// Human-readable engine name for logs.
    fn name(&self) -> &str;

    /// Parse UTF-8 HTML into a document tree.
    fn parse_html<'a>(&'a self, html: &'a str) -> BoxFuture<'a, Result<PandocDocument, Docs2GfmError>>;

    /// Serialise a (filtered) document tree to GitHub Flavored Markdown.
    fn render_gfm<'a>(
        &'a self,
        doc: &'a PandocDocument,
    ) -> BoxFuture<'a, Result<String, Docs2GfmError>>;
}

/// Arguments for the HTML → JSON call.
pub const HTML_TO_JSON_ARGS: &[&str] = &["--from=html", "--to=json"];

/// Arguments for the JSON → GFM call. `--wrap=none` keeps paragraphs on one
/// line so diffs stay line-per-paragraph.
pub const JSON_TO_GFM_ARGS: &[&str] = &["--from=json", "--to=gfm", "--wrap=none"];

/// [`MarkupEngine`] backed by the `pandoc` executable.
#[derive(Debug, Clone)]
pub struct PandocEngine {
    program: String,
    timeout_secs: u64,
}

impl PandocEngine {
    pub fn new(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl MarkupEngine for PandocEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn parse_html<'a>(&'a self, html: &'a str) -> BoxFuture<'a, Result<PandocDocument, Docs2GfmError>> {
        Box::pin(async move {
            let json = run_command(
                &self.program,
                HTML_TO_JSON_ARGS,
                Some(html.as_bytes().to_vec()),
                self.timeout_secs,
            )
            .await?;
            serde_json::from_str(&json).map_err(|e| Docs2GfmError::EngineOutput {
                detail: format!("{} produced an unreadable document tree: {e}", self.program),
            })
        })
    }

    fn render_gfm<'a>(
        &'a self,
        doc: &'a PandocDocument,
    ) -> BoxFuture<'a, Result<String, Docs2GfmError>> {
        Box::pin(async move {
            let json = serde_json::to_vec(doc)
                .map_err(|e| Docs2GfmError::Internal(format!("serialising document tree: {e}")))?;
            run_command(&self.program, JSON_TO_GFM_ARGS, Some(json), self.timeout_secs).await
        })
    }
}

/// Run an external program to completion and return its stdout as UTF-8.
///
/// `stdin` is written from a separate task so a large input cannot deadlock
/// against a child that is already filling its stdout pipe.
pub(crate) async fn run_command<S: AsRef<str>>(
    program: &str,
    args: &[S],
    stdin: Option<Vec<u8>>,
    timeout_secs: u64,
) -> Result<String, Docs2GfmError> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    debug!("Running: {} {}", program, args.join(" "));
    let start = Instant::now();

    let mut child = Command::new(program)
        .args(&args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Docs2GfmError::EngineNotFound {
                program: program.to_string(),
            },
            _ => Docs2GfmError::Internal(format!("failed to start '{program}': {e}")),
        })?;

    let writer = match (stdin, child.stdin.take()) {
        (Some(bytes), Some(mut pipe)) => Some(tokio::spawn(async move {
            pipe.write_all(&bytes).await?;
            pipe.shutdown().await
        })),
        _ => None,
    };

    // Dropping the future on timeout drops the child, and kill_on_drop reaps it.
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
        .await
        .map_err(|_| Docs2GfmError::EngineTimeout {
            program: program.to_string(),
            secs: timeout_secs,
        })?
        .map_err(|e| Docs2GfmError::Internal(format!("waiting for '{program}': {e}")))?;

    if let Some(writer) = writer {
        if let Ok(Err(e)) = writer.await {
            debug!("{}: stdin write ended early: {}", program, e);
        }
    }

    if !output.status.success() {
        return Err(Docs2GfmError::EngineFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!(
        "{} finished in {}ms ({} bytes)",
        program,
        start.elapsed().as_millis(),
        output.stdout.len()
    );
    decode_utf8(output.stdout, &format!("{program} output"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gfm_args_disable_wrapping() {
        assert!(JSON_TO_GFM_ARGS.contains(&"--wrap=none"));
        assert!(JSON_TO_GFM_ARGS.contains(&"--to=gfm"));
        assert!(HTML_TO_JSON_ARGS.contains(&"--from=html"));
    }

    #[test]
    fn missing_program_is_engine_not_found() {
        let err = tokio_test::block_on(run_command::<&str>(
            "docs2gfm-no-such-engine",
            &[],
            None,
            5,
        ))
        .unwrap_err();
        assert!(matches!(err, Docs2GfmError::EngineNotFound { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdin_is_piped_through() {
        let out = run_command::<&str>("cat", &[], Some(b"hello".to_vec()), 5)
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let err = run_command("sh", &["-c", "echo boom >&2; exit 3"], None, 5)
            .await
            .unwrap_err();
        match err {
            Docs2GfmError::EngineFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("expected EngineFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_program_times_out() {
        let err = run_command("sleep", &["5"], None, 1).await.unwrap_err();
        assert!(matches!(err, Docs2GfmError::EngineTimeout { secs: 1, .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_output_is_encoding_error() {
        let err = run_command("printf", &["\\377"], None, 5).await.unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidUtf8 { .. }), "got {err:?}");
    }
}
