use crate::archive::IgraArchiveReader;
use crate::config::LoaderConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::{FileSummary, LoadReport};
use crate::utils::progress::ProgressReporter;
use crate::writers::SqliteWriter;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// Number of pool threads for `file_count` archives, never below `floor`.
pub fn pool_size(file_count: usize, floor: usize) -> usize {
    file_count.max(floor)
}

/// List the files directly under `dir` whose names end with `suffix`.
pub fn discover_archives(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ProcessingError::InvalidInput(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }

        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if matches {
            archives.push(path);
        }
    }

    archives.sort();
    Ok(archives)
}

/// Loads every archive of a directory on a dedicated thread pool, one task
/// per archive, each with its own database connection.
pub struct ParallelProcessor {
    config: LoaderConfig,
}

impl ParallelProcessor {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn worker_count(&self, file_count: usize) -> usize {
        pool_size(file_count, self.config.ingest.min_workers)
    }

    pub fn process_directory(
        &self,
        input_dir: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<LoadReport> {
        let archives = discover_archives(input_dir, &self.config.ingest.archive_suffix)?;
        self.process_archives(&archives, progress)
    }

    /// Process `archives` concurrently. Failed files are logged and left out
    /// of the grand total; only pool construction fails the whole run.
    pub fn process_archives(
        &self,
        archives: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<LoadReport> {
        let workers = self.worker_count(archives.len());
        info!(files = archives.len(), workers, "Processing archives");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("igra-worker-{}", i))
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let results: Vec<Option<FileSummary>> = pool.install(|| {
            archives
                .par_iter()
                .map(|path| {
                    let result = run_task(path, self.config.clone());

                    if let Some(p) = progress {
                        p.increment(1);
                    }

                    result
                })
                .collect()
        });

        let report = LoadReport::from_results(results);
        info!(
            files = report.files_processed,
            failed = report.files_failed,
            grand_total = report.grand_total,
            "Grand total of correctly processed lines"
        );

        Ok(report)
    }
}

/// Run one file to completion, turning errors and panics into `None`.
fn run_task(path: &Path, config: LoaderConfig) -> Option<FileSummary> {
    let outcome = catch_unwind(AssertUnwindSafe(|| process_file(path, config)))
        .unwrap_or_else(|payload| {
            Err(ProcessingError::TaskPanicked {
                path: path.display().to_string(),
                message: panic_message(payload.as_ref()),
            })
        });

    match outcome {
        Ok(summary) => Some(summary),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to process archive");
            None
        }
    }
}

/// Load a single archive through a connection owned by this call.
pub fn process_file(path: &Path, config: LoaderConfig) -> Result<FileSummary> {
    let start = Instant::now();
    info!(path = %path.display(), "Processing archive");

    let mut writer = SqliteWriter::open(&config.database)?;
    let reader = IgraArchiveReader::new(config.ingest.batch_size);
    let summary = reader.process_archive(path, &mut writer)?;

    info!(
        path = %path.display(),
        lines = summary.correct_lines,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Finished archive"
    );
    Ok(summary)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
