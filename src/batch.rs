//! Directory conversion: every supported file under a tree, mirrored into an
//! output tree as `.md`.
//!
//! Jobs are independent. Each one resolves its own input, runs its own
//! engine processes and writes its own output atomically, so a failure is
//! recorded as a [`JobError`] and never stops or corrupts a sibling.
//!
//! [`convert_dir`] waits for all jobs and returns a [`BatchReport`] in
//! discovery order; [`convert_dir_stream`] yields each [`JobResult`] as soon
//! as it finishes (completion order).

use crate::config::ConversionConfig;
use crate::convert::convert_to_file;
use crate::error::{Docs2GfmError, JobError};
use crate::output::{BatchReport, JobResult};
use crate::pipeline::input::InputKind;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A boxed stream of finished jobs.
pub type JobStream = Pin<Box<dyn Stream<Item = JobResult> + Send>>;

/// One file to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Position in discovery order (0-indexed).
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: InputKind,
}

/// Walk `input_dir` and map every supported file to its output path.
///
/// Traversal is sorted by file name so job order is stable across runs.
/// Files with other extensions are ignored. When two sources map to the same
/// output (`setup.html` and `setup.pdf`), the first one wins and the other is
/// skipped with a warning.
pub fn discover_jobs(input_dir: &Path, output_dir: &Path) -> Result<Vec<ConversionJob>, Docs2GfmError> {
    if !input_dir.is_dir() {
        return Err(Docs2GfmError::InvalidInput {
            path: input_dir.to_path_buf(),
            reason: "batch input must be a directory".into(),
        });
    }
    if output_dir.is_file() {
        return Err(Docs2GfmError::InvalidInput {
            path: output_dir.to_path_buf(),
            reason: "batch output must be a directory, found a file".into(),
        });
    }

    let mut jobs = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = InputKind::from_path(entry.path()) else {
            debug!("Ignoring {}", entry.path().display());
            continue;
        };
        let Ok(relative) = entry.path().strip_prefix(input_dir) else {
            continue;
        };

        let output = output_dir.join(relative).with_extension("md");
        if !claimed.insert(output.clone()) {
            warn!(
                "Skipping {}: {} is already produced by another source",
                entry.path().display(),
                output.display()
            );
            continue;
        }

        jobs.push(ConversionJob {
            index: jobs.len(),
            input: entry.path().to_path_buf(),
            output,
            kind,
        });
    }

    debug!("Discovered {} jobs under {}", jobs.len(), input_dir.display());
    Ok(jobs)
}

/// Convert every supported file under `input_dir` into `output_dir`.
///
/// At most `config.concurrency` jobs run at once.
///
/// # Returns
/// `Ok(BatchReport)` even when some jobs failed (check `report.failed`).
///
/// # Errors
/// Only for a bad input/output directory pair.
pub async fn convert_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchReport, Docs2GfmError> {
    let start = Instant::now();
    let input_dir = input_dir.as_ref();
    let jobs = discover_jobs(input_dir, output_dir.as_ref())?;
    let total = jobs.len();
    info!("Converting {} files from {}", total, input_dir.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results: Vec<(usize, JobResult)> = stream::iter(jobs.into_iter().map(|job| async move {
        let index = job.index;
        (index, run_job(job, total, config).await)
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Sort by discovery order for a stable report
    results.sort_by_key(|(index, _)| *index);

    let report = BatchReport::from_jobs(
        results.into_iter().map(|(_, r)| r).collect(),
        start.elapsed().as_millis() as u64,
    );

    info!(
        "Batch complete: {}/{} succeeded, {}ms total",
        report.succeeded, report.total, report.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, report.succeeded);
    }

    Ok(report)
}

/// Like [`convert_dir`], but yields each job as it completes.
///
/// `on_batch_start` fires before this returns and the per-job callbacks fire
/// as the stream is polled; `on_batch_complete` is left to the caller.
pub async fn convert_dir_stream(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<JobStream, Docs2GfmError> {
    let jobs = discover_jobs(input_dir.as_ref(), output_dir.as_ref())?;
    let total = jobs.len();
    info!(
        "Starting streaming batch: {} files from {}",
        total,
        input_dir.as_ref().display()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let concurrency = config.concurrency;
    let config = Arc::new(config.clone());
    let s = stream::iter(jobs)
        .map(move |job| {
            let cfg = Arc::clone(&config);
            async move { run_job(job, total, &cfg).await }
        })
        .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_job(job: ConversionJob, total: usize, config: &ConversionConfig) -> JobResult {
    if let Some(ref cb) = config.progress_callback {
        cb.on_job_start(job.index, total, &job.input);
    }

    match convert_to_file(&job.input, &job.output, config).await {
        Ok(stats) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_job_complete(job.index, total, &job.input, stats.output_bytes);
            }
            JobResult {
                input: job.input,
                output: job.output,
                stats: Some(stats),
                error: None,
            }
        }
        Err(e) => {
            warn!("Failed to convert {}: {}", job.input.display(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_job_error(job.index, total, &job.input, &e.to_string());
            }
            JobResult {
                error: Some(JobError::from_fatal(&job.input, &e)),
                input: job.input,
                output: job.output,
                stats: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<p>x</p>").unwrap();
    }

    #[test]
    fn discovery_mirrors_relative_paths() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        touch(&src.path().join("index.html"));
        touch(&src.path().join("guide/setup.htm"));
        touch(&src.path().join("guide/manual.PDF"));
        touch(&src.path().join("notes.txt"));

        let jobs = discover_jobs(src.path(), out.path()).unwrap();
        let outputs: Vec<PathBuf> = jobs
            .iter()
            .map(|j| j.output.strip_prefix(out.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("guide/manual.md"),
                PathBuf::from("guide/setup.md"),
                PathBuf::from("index.md"),
            ]
        );
        assert_eq!(jobs[0].kind, InputKind::Pdf);
        assert_eq!(
            jobs.iter().map(|j| j.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn colliding_outputs_keep_first() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        touch(&src.path().join("setup.html"));
        touch(&src.path().join("setup.pdf"));
        let jobs = discover_jobs(src.path(), out.path()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, InputKind::Html);
    }

    #[test]
    fn input_must_be_directory() {
        let src = tempfile::tempdir().unwrap();
        let file = src.path().join("a.html");
        touch(&file);
        let err = discover_jobs(&file, src.path()).unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidInput { .. }));
    }

    #[test]
    fn output_must_not_be_file() {
        let src = tempfile::tempdir().unwrap();
        let file = src.path().join("out.md");
        std::fs::write(&file, "").unwrap();
        let err = discover_jobs(src.path(), &file).unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn empty_directory_gives_empty_report() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let report = convert_dir(src.path(), out.path(), &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(report.total, 0);
        assert!(report.is_success());
    }
}
