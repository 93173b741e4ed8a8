//! Output types returned by the conversion and batch entry points.

use crate::error::JobError;
use crate::pipeline::input::InputKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The result of converting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Final, normalised GFM.
    pub markdown: String,
    /// What the source was.
    pub kind: InputKind,
    pub stats: ConversionStats,
}

/// Timing and size figures for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Bytes of HTML fed to the engine (after extraction for PDF/DOCX).
    pub input_bytes: usize,
    /// Bytes of Markdown produced.
    pub output_bytes: usize,
    /// Time spent in the extractor, zero for HTML sources.
    pub extract_duration_ms: u64,
    /// Time spent in the engine (parse + render).
    pub engine_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Outcome of one job in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Source file.
    pub input: PathBuf,
    /// Destination file (only written on success).
    pub output: PathBuf,
    /// Stats on success.
    pub stats: Option<ConversionStats>,
    /// Set if this job failed.
    pub error: Option<JobError>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate result of a directory conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Every job, in discovery order.
    pub jobs: Vec<JobResult>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

impl BatchReport {
    /// Build a report from finished jobs; counts are derived from `jobs`.
    pub fn from_jobs(jobs: Vec<JobResult>, total_duration_ms: u64) -> Self {
        let succeeded = jobs.iter().filter(|j| j.is_success()).count();
        Self {
            total: jobs.len(),
            succeeded,
            failed: jobs.len() - succeeded,
            jobs,
            total_duration_ms,
        }
    }

    /// True when no job failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// The failed jobs' errors.
    pub fn errors(&self) -> impl Iterator<Item = &JobError> {
        self.jobs.iter().filter_map(|j| j.error.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn job(name: &str, failed: bool) -> JobResult {
        JobResult {
            input: PathBuf::from(format!("{name}.html")),
            output: PathBuf::from(format!("{name}.md")),
            stats: (!failed).then(ConversionStats::default),
            error: failed.then(|| JobError {
                path: PathBuf::from(format!("{name}.html")),
                category: ErrorCategory::Engine,
                message: "boom".into(),
            }),
        }
    }

    #[test]
    fn report_counts_derive_from_jobs() {
        let report = BatchReport::from_jobs(vec![job("a", false), job("b", true), job("c", false)], 12);
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_success());
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn empty_report_is_success() {
        let report = BatchReport::from_jobs(vec![], 0);
        assert!(report.is_success());
        assert_eq!(report.total, 0);
    }

    #[test]
    fn report_serialises_to_json() {
        let report = BatchReport::from_jobs(vec![job("a", true)], 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["jobs"][0]["error"]["category"], "engine");
    }
}
