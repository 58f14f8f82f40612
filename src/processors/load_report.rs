use crate::writers::BatchReport;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Line accounting for one scanned stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub total_lines: usize,
    pub header_lines: usize,
    pub failed_lines: usize,
    /// Rows reported by the persister across all flushes.
    pub saved_lines: usize,
    /// Rows the persister dropped at bind time; a subset of `saved_lines`.
    pub skipped_rows: usize,
    pub flushes: usize,
}

impl LineCounts {
    /// Every non-header line, decoded or not.
    pub fn correct_lines(&self) -> usize {
        self.total_lines - self.header_lines
    }

    /// Lines that should have been saved but were not.
    pub fn discrepancy(&self) -> i64 {
        self.correct_lines() as i64 - self.saved_lines as i64
    }

    pub fn absorb(&mut self, report: BatchReport) {
        self.saved_lines += report.rows;
        self.skipped_rows += report.skipped;
        self.flushes += 1;
    }
}

/// Result of loading one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    #[serde(flatten)]
    pub counts: LineCounts,
    pub correct_lines: usize,
    pub discrepancy: i64,
    pub elapsed_ms: u64,
}

impl FileSummary {
    pub fn new(path: PathBuf, counts: LineCounts, elapsed: Duration) -> Self {
        Self {
            path,
            counts,
            correct_lines: counts.correct_lines(),
            discrepancy: counts.discrepancy(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Aggregate over every archive submitted in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    /// Sum of `correct_lines` over the files that completed.
    pub grand_total: usize,
    pub total_discrepancy: i64,
    pub files: Vec<FileSummary>,
}

impl LoadReport {
    /// Fold per-file outcomes; `None` marks a file whose task failed.
    pub fn from_results(results: Vec<Option<FileSummary>>) -> Self {
        let files_found = results.len();
        let files: Vec<FileSummary> = results.into_iter().flatten().collect();

        Self {
            files_found,
            files_processed: files.len(),
            files_failed: files_found - files.len(),
            grand_total: files.iter().map(|f| f.correct_lines).sum(),
            total_discrepancy: files.iter().map(|f| f.discrepancy).sum(),
            files,
        }
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Load Report ===\n");
        summary.push_str(&format!("Archives Found: {}\n", self.files_found));
        summary.push_str(&format!("Archives Loaded: {}\n", self.files_processed));
        summary.push_str(&format!("Archives Failed: {}\n", self.files_failed));
        summary.push_str(&format!("Grand Total Data Lines: {}\n", self.grand_total));

        if self.total_discrepancy != 0 {
            summary.push_str(&format!(
                "Unsaved Data Lines: {}\n",
                self.total_discrepancy
            ));
        }

        for file in &self.files {
            summary.push_str(&format!(
                "  {}: {} data lines, {} headers, {} failed, {} ms\n",
                file.path.display(),
                file.correct_lines,
                file.counts.header_lines,
                file.counts.failed_lines,
                file.elapsed_ms
            ));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, total: usize, headers: usize, saved: usize) -> FileSummary {
        let counts = LineCounts {
            total_lines: total,
            header_lines: headers,
            saved_lines: saved,
            ..LineCounts::default()
        };
        FileSummary::new(PathBuf::from(name), counts, Duration::from_millis(5))
    }

    #[test]
    fn test_counts_accounting() {
        let mut counts = LineCounts {
            total_lines: 12,
            header_lines: 2,
            failed_lines: 3,
            ..LineCounts::default()
        };
        counts.absorb(BatchReport { rows: 6, skipped: 1 });
        counts.absorb(BatchReport { rows: 1, skipped: 0 });

        assert_eq!(counts.correct_lines(), 10);
        assert_eq!(counts.saved_lines, 7);
        assert_eq!(counts.skipped_rows, 1);
        assert_eq!(counts.flushes, 2);
        assert_eq!(counts.discrepancy(), 3);
    }

    #[test]
    fn test_failed_files_are_excluded_from_grand_total() {
        let report = LoadReport::from_results(vec![
            Some(summary("a.zip", 10, 2, 8)),
            None,
            Some(summary("c.zip", 5, 1, 3)),
        ]);

        assert_eq!(report.files_found, 3);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.grand_total, 12);
        assert_eq!(report.total_discrepancy, 1);
    }

    #[test]
    fn test_empty_run() {
        let report = LoadReport::from_results(Vec::new());

        assert_eq!(report, LoadReport::default());
        assert!(report.generate_summary().contains("Grand Total Data Lines: 0"));
    }

    #[test]
    fn test_report_serializes_flattened_counts() {
        let report = LoadReport::from_results(vec![Some(summary("a.zip", 3, 1, 2))]);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["grand_total"], 2);
        assert_eq!(json["files"][0]["total_lines"], 3);
        assert_eq!(json["files"][0]["correct_lines"], 2);
    }
}
