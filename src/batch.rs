//! Batch extraction over a directory of PDFs
//!
//! Files are processed one by one or on a rayon pool. Workers only return
//! results; the caller thread merges them in input order, so records and
//! failures always come out in file-name order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::extract::NewspaperExtractor;
use crate::pdf::DocumentError;
use crate::record::ExtractionRecord;

// ============================================================
// Error Types
// ============================================================

/// Batch-level failures (per-file errors are collected, not raised)
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================
// Discovery
// ============================================================

/// PDF files directly inside `dir` (names ending in `.pdf`), sorted by name
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.exists() {
        return Err(BatchError::InputNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    log::debug!("Discovered {} PDF files in {}", files.len(), dir.display());
    Ok(files)
}

// ============================================================
// Progress
// ============================================================

/// Observer for batch progress. Called from worker threads when running in
/// parallel.
pub trait ProgressCallback: Sync {
    fn on_batch_start(&self, _total: usize) {}
    fn on_file_start(&self, _path: &Path) {}
    fn on_file_complete(&self, _path: &Path, _ok: bool) {}
    fn on_debug(&self, _message: &str) {}
}

/// Progress observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {}

// ============================================================
// Report
// ============================================================

/// A file that could not be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub filename: String,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub records: Vec<ExtractionRecord>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Distinct publishers among successful records
    pub fn publishers(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .filter_map(|r| r.publisher.as_deref())
            .collect()
    }

    pub fn unique_publishers(&self) -> usize {
        self.publishers().len()
    }

    /// Earliest and latest `(year, month)` among records that have both
    pub fn date_range(&self) -> Option<((u32, u32), (u32, u32))> {
        let mut dates = self.records.iter().filter_map(ExtractionRecord::year_month);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

// ============================================================
// Runner
// ============================================================

/// Runs an extractor over many files
#[derive(Debug, Clone)]
pub struct BatchRunner {
    extractor: NewspaperExtractor,
    jobs: usize,
}

impl BatchRunner {
    /// `jobs == 0` uses one worker per CPU
    pub fn new(extractor: NewspaperExtractor, jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { extractor, jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Extract every path and collect records and failures in input order
    pub fn run<P: ProgressCallback>(
        &self,
        paths: &[PathBuf],
        progress: &P,
    ) -> Result<BatchReport, BatchError> {
        progress.on_batch_start(paths.len());

        let results: Vec<Result<ExtractionRecord, DocumentError>> = if self.jobs <= 1 {
            paths.iter().map(|p| self.process(p, progress)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()?;
            progress.on_debug(&format!("{} workers", self.jobs));
            pool.install(|| paths.par_iter().map(|p| self.process(p, progress)).collect())
        };

        let mut report = BatchReport {
            total: paths.len(),
            ..Default::default()
        };
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(record) => report.records.push(record),
                Err(e) => report.failures.push(BatchFailure {
                    filename: display_name(path),
                    path: path.clone(),
                    error: e.to_string(),
                }),
            }
        }
        log::info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn process<P: ProgressCallback>(
        &self,
        path: &Path,
        progress: &P,
    ) -> Result<ExtractionRecord, DocumentError> {
        progress.on_file_start(path);
        let result = self.extractor.extract(path);
        match &result {
            Ok(_) => progress.on_debug(&format!("Successfully processed: {}", display_name(path))),
            Err(e) => {
                log::warn!("Error processing {}: {}", display_name(path), e);
            }
        }
        progress.on_file_complete(path, result.is_ok());
        result
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    use crate::converter::TextConverter;
    use crate::header::ParserOptions;

    /// Reads the file itself as converted text; "broken" files fail
    struct PlainText;

    impl TextConverter for PlainText {
        fn convert(&self, path: &Path) -> Result<String, DocumentError> {
            let text = fs::read_to_string(path)?;
            if text.starts_with("broken") {
                return Err(DocumentError::NoPages);
            }
            Ok(text)
        }
    }

    fn runner(jobs: usize) -> BatchRunner {
        let extractor =
            NewspaperExtractor::with_converter(Arc::new(PlainText), ParserOptions::default());
        BatchRunner::new(extractor, jobs)
    }

    #[derive(Default)]
    struct Counting {
        started: AtomicUsize,
        completed: AtomicUsize,
        ok: AtomicUsize,
    }

    impl ProgressCallback for Counting {
        fn on_file_start(&self, _path: &Path) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_complete(&self, _path: &Path, ok: bool) {
            self.completed.fetch_add(1, Ordering::SeqCst);
            if ok {
                self.ok.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn sample_dir() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), "光明日报/2021年7月1日/第2版\n").unwrap();
        fs::write(dir.path().join("a.pdf"), "人民日报/2020年3月5日/第4版\n").unwrap();
        fs::write(dir.path().join("c.pdf"), "broken").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("UPPER.PDF"), "ignored").unwrap();
        fs::create_dir(dir.path().join("sub.pdf")).unwrap();
        dir
    }

    #[test]
    fn test_discover_pdfs_filters_and_sorts() {
        let dir = sample_dir();
        let files = discover_pdfs(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let result = discover_pdfs(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(BatchError::InputNotFound(_))));
    }

    #[test]
    fn test_discover_file_is_not_dir() {
        let dir = sample_dir();
        let result = discover_pdfs(&dir.path().join("a.pdf"));
        assert!(matches!(result, Err(BatchError::NotADirectory(_))));
    }

    #[test]
    fn test_run_sequential_report() {
        let dir = sample_dir();
        let files = discover_pdfs(dir.path()).unwrap();
        let progress = Counting::default();
        let report = runner(1).run(&files, &progress).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded() + report.failed(), report.total);
        assert_eq!(report.failures[0].filename, "c.pdf");
        assert_eq!(report.unique_publishers(), 2);
        assert_eq!(report.date_range(), Some(((2020, 3), (2021, 7))));
        assert_eq!(progress.started.load(Ordering::SeqCst), 3);
        assert_eq!(progress.completed.load(Ordering::SeqCst), 3);
        assert_eq!(progress.ok.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = sample_dir();
        let files = discover_pdfs(dir.path()).unwrap();
        let sequential = runner(1).run(&files, &SilentProgress).unwrap();
        let parallel = runner(4).run(&files, &SilentProgress).unwrap();
        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.failures, parallel.failures);
    }

    #[test]
    fn test_jobs_zero_uses_cpus() {
        assert_eq!(runner(0).jobs(), num_cpus::get());
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::default();
        assert_eq!(report.date_range(), None);
        assert_eq!(report.unique_publishers(), 0);
    }

    #[test]
    fn test_date_range_uses_pairs() {
        let record = |year, month| ExtractionRecord {
            year: Some(year),
            month: Some(month),
            ..Default::default()
        };
        let report = BatchReport {
            total: 2,
            records: vec![record(2020, 11), record(2021, 2)],
            failures: vec![],
        };
        assert_eq!(report.date_range(), Some(((2020, 11), (2021, 2))));
    }
}
