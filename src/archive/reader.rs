use crate::error::{ProcessingError, Result};
use crate::models::{Group, Header, Record};
use crate::processors::{FileSummary, LineCounts};
use crate::readers::LineDecoder;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, RECORD_CAPACITY_HINT};
use crate::writers::BatchSink;
use encoding_rs::UTF_8;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};
use zip::ZipArchive;

/// Streams the first entry of an IGRA archive into header groups and hands
/// them to a [`BatchSink`] in bounded batches.
pub struct IgraArchiveReader {
    batch_size: usize,
}

impl IgraArchiveReader {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Load one archive and return its line accounting.
    pub fn process_archive<S: BatchSink + ?Sized>(
        &self,
        zip_path: &Path,
        sink: &mut S,
    ) -> Result<FileSummary> {
        let start = Instant::now();
        let source = zip_path.display().to_string();

        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;
        if archive.len() == 0 {
            return Err(ProcessingError::EmptyArchive(source));
        }

        let entry = archive.by_index(0)?;
        debug!(source = %source, entry = entry.name(), "Reading archive entry");

        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, entry);
        let counts = self.scan(reader, sink, &source)?;

        Ok(FileSummary::new(
            zip_path.to_path_buf(),
            counts,
            start.elapsed(),
        ))
    }

    /// Scan a line stream, flushing groups whenever the unflushed data
    /// lines exceed the batch size and once more at end of stream.
    pub fn scan<R: BufRead, S: BatchSink + ?Sized>(
        &self,
        mut reader: R,
        sink: &mut S,
        source: &str,
    ) -> Result<LineCounts> {
        let mut counts = LineCounts::default();
        let mut committed = 0;
        let mut pending: Vec<Group> = Vec::new();
        let mut header: Option<Header> = None;
        let mut records: Vec<Record> = Vec::with_capacity(RECORD_CAPACITY_HINT);
        let mut buf = Vec::with_capacity(128);

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = decode_line(&buf, source, counts.total_lines + 1);

            if LineDecoder::is_header_line(&line) {
                if counts.total_lines != 0 {
                    let finished = std::mem::replace(
                        &mut records,
                        Vec::with_capacity(RECORD_CAPACITY_HINT),
                    );
                    pending.push(Group::new(header.take(), finished));
                }

                header = LineDecoder::decode_header(&line);
                match header {
                    Some(_) => counts.header_lines += 1,
                    None => counts.failed_lines += 1,
                }

                let unflushed = counts
                    .total_lines
                    .saturating_sub(counts.header_lines + committed);
                if unflushed > self.batch_size {
                    flush(&mut pending, sink, &mut counts, source)?;
                    committed = counts.total_lines;
                }
            } else {
                match LineDecoder::decode_record(&line) {
                    Some(record) => records.push(record),
                    None => counts.failed_lines += 1,
                }
            }

            counts.total_lines += 1;
        }

        pending.push(Group::new(header, records));
        flush(&mut pending, sink, &mut counts, source)?;

        reconcile(&counts, source);
        Ok(counts)
    }
}

fn flush<S: BatchSink + ?Sized>(
    pending: &mut Vec<Group>,
    sink: &mut S,
    counts: &mut LineCounts,
    source: &str,
) -> Result<()> {
    let report = sink.save_batch(pending)?;
    debug!(
        source,
        groups = pending.len(),
        rows = report.rows,
        skipped = report.skipped,
        "Flushed batch"
    );

    counts.absorb(report);
    pending.clear();
    Ok(())
}

fn reconcile(counts: &LineCounts, source: &str) {
    let correct = counts.correct_lines();

    if correct == counts.saved_lines {
        info!(source, lines = correct, "All data lines saved");
    } else {
        error!(
            source,
            correct_lines = correct,
            saved_lines = counts.saved_lines,
            difference = counts.discrepancy(),
            "Saved lines do not match data lines"
        );
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
fn decode_line<'a>(raw: &'a [u8], source: &str, line_number: usize) -> Cow<'a, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    let (text, had_errors) = UTF_8.decode_without_bom_handling(raw);
    if had_errors {
        debug!(source, line_number, "Replaced invalid UTF-8 sequences");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::total_records;
    use crate::writers::BatchReport;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    const HEADER_A: &str =
        "#USM00070261 1930 08 26 99 1700    6          cdmp-usm  648161 -1478767";
    const HEADER_B: &str =
        "#BRM00082332 2001 12 31 12 1115   42 ncar-ssd            -31300  -600200";
    const RECORD: &str = "10 -9999  40000  6440B -441B-9999 -9999   180   110";
    const BAD_RECORD: &str = "10 -9999  4x000  6440B -441B-9999 -9999   180   110";

    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<Group>>,
    }

    impl BatchSink for RecordingSink {
        fn save_batch(&mut self, groups: &[Group]) -> Result<BatchReport> {
            self.batches.push(groups.to_vec());
            Ok(BatchReport {
                rows: total_records(groups),
                skipped: 0,
            })
        }
    }

    struct FailingSink;

    impl BatchSink for FailingSink {
        fn save_batch(&mut self, _groups: &[Group]) -> Result<BatchReport> {
            Err(ProcessingError::Database(rusqlite::Error::InvalidQuery))
        }
    }

    fn scan(lines: &[&str], batch_size: usize) -> Result<(LineCounts, RecordingSink)> {
        let text = lines.join("\n");
        let mut sink = RecordingSink::default();
        let counts = IgraArchiveReader::new(batch_size).scan(
            Cursor::new(text.into_bytes()),
            &mut sink,
            "test",
        )?;
        Ok((counts, sink))
    }

    fn record_counts(batch: &[Group]) -> Vec<usize> {
        batch.iter().map(Group::record_count).collect()
    }

    #[test]
    fn test_groups_follow_headers() -> Result<()> {
        let (counts, sink) = scan(
            &[HEADER_A, RECORD, RECORD, HEADER_B, RECORD, HEADER_A, RECORD, RECORD, RECORD],
            100,
        )?;

        assert_eq!(sink.batches.len(), 1);
        assert_eq!(record_counts(&sink.batches[0]), vec![2, 1, 3]);
        assert_eq!(
            sink.batches[0][1].header.as_ref().map(|h| h.id.as_str()),
            Some("BRM00082332")
        );

        assert_eq!(counts.total_lines, 9);
        assert_eq!(counts.header_lines, 3);
        assert_eq!(counts.correct_lines(), 6);
        assert_eq!(counts.saved_lines, 6);
        assert_eq!(counts.discrepancy(), 0);
        Ok(())
    }

    #[test]
    fn test_leading_records_form_headerless_group() -> Result<()> {
        let (counts, sink) = scan(&[RECORD, RECORD, HEADER_A, RECORD], 100)?;

        let groups = &sink.batches[0];
        assert_eq!(groups.len(), 2);
        assert!(groups[0].header.is_none());
        assert_eq!(groups[0].record_count(), 2);
        assert!(groups[1].header.is_some());
        assert_eq!(counts.correct_lines(), 3);
        Ok(())
    }

    #[test]
    fn test_threshold_flush_then_final_flush() -> Result<()> {
        let (counts, sink) = scan(
            &[HEADER_A, RECORD, RECORD, HEADER_B, RECORD, RECORD, HEADER_A, RECORD],
            1,
        )?;

        assert_eq!(sink.batches.len(), 2);
        assert_eq!(record_counts(&sink.batches[0]), vec![2, 2]);
        assert_eq!(record_counts(&sink.batches[1]), vec![1]);
        assert_eq!(counts.flushes, 2);
        assert_eq!(counts.saved_lines, 5);
        assert_eq!(counts.discrepancy(), 0);
        Ok(())
    }

    #[test]
    fn test_final_group_flushed_once_after_threshold_flush() -> Result<()> {
        let (counts, sink) = scan(&[HEADER_A, RECORD, RECORD, RECORD, HEADER_B], 1)?;

        assert_eq!(sink.batches.len(), 2);
        assert_eq!(record_counts(&sink.batches[0]), vec![3]);
        assert_eq!(record_counts(&sink.batches[1]), vec![0]);
        assert_eq!(
            sink.batches[1][0].header.as_ref().map(|h| h.id.as_str()),
            Some("BRM00082332")
        );
        assert_eq!(counts.saved_lines, 3);
        Ok(())
    }

    #[test]
    fn test_malformed_records_show_as_discrepancy() -> Result<()> {
        let (counts, _) = scan(&[HEADER_A, RECORD, BAD_RECORD, RECORD, BAD_RECORD], 100)?;

        assert_eq!(counts.failed_lines, 2);
        assert_eq!(counts.correct_lines(), 4);
        assert_eq!(counts.saved_lines, 2);
        assert_eq!(counts.discrepancy(), 2);
        Ok(())
    }

    #[test]
    fn test_malformed_header_is_not_counted() -> Result<()> {
        let (counts, sink) = scan(&[HEADER_A, RECORD, "#USM0007026 1930", RECORD], 100)?;

        assert_eq!(counts.header_lines, 1);
        assert_eq!(counts.failed_lines, 1);
        assert_eq!(counts.correct_lines(), 3);
        assert_eq!(counts.discrepancy(), 1);

        let groups = &sink.batches[0];
        assert_eq!(groups.len(), 2);
        assert!(groups[1].header.is_none());
        assert_eq!(groups[1].record_count(), 1);
        Ok(())
    }

    #[test]
    fn test_crlf_and_invalid_utf8() -> Result<()> {
        let mut bytes = format!("{HEADER_A}\r\n{RECORD}\r\n").into_bytes();
        bytes.extend_from_slice(b"10 -9999  40000  6440B \xff441B-9999 -9999   180   110\r\n");

        let mut sink = RecordingSink::default();
        let counts = IgraArchiveReader::new(100).scan(Cursor::new(bytes), &mut sink, "test")?;

        assert_eq!(counts.total_lines, 3);
        assert_eq!(counts.header_lines, 1);
        assert_eq!(counts.failed_lines, 1);
        assert_eq!(counts.saved_lines, 1);
        Ok(())
    }

    #[test]
    fn test_empty_stream_flushes_one_empty_group() -> Result<()> {
        let (counts, sink) = scan(&[], 100)?;

        assert_eq!(sink.batches.len(), 1);
        assert_eq!(record_counts(&sink.batches[0]), vec![0]);
        assert_eq!(counts, LineCounts { flushes: 1, ..LineCounts::default() });
        Ok(())
    }

    #[test]
    fn test_sink_failure_fails_the_scan() {
        let result = IgraArchiveReader::new(100).scan(
            Cursor::new(format!("{HEADER_A}\n{RECORD}").into_bytes()),
            &mut FailingSink,
            "test",
        );

        assert!(matches!(result, Err(ProcessingError::Database(_))));
    }

    #[test]
    fn test_process_archive_reads_first_entry() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("USM00070261-data.txt.zip");

        let mut zip = zip::ZipWriter::new(File::create(&path)?);
        zip.start_file("USM00070261-data.txt", zip::write::FileOptions::default())?;
        writeln!(zip, "{HEADER_A}\n{RECORD}\n{RECORD}")?;
        zip.finish()?;

        let mut sink = RecordingSink::default();
        let summary = IgraArchiveReader::new(100).process_archive(&path, &mut sink)?;

        assert_eq!(summary.path, path);
        assert_eq!(summary.correct_lines, 2);
        assert_eq!(summary.counts.saved_lines, 2);
        assert_eq!(summary.discrepancy, 0);
        Ok(())
    }

    #[test]
    fn test_process_archive_errors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let reader = IgraArchiveReader::new(100);
        let mut sink = RecordingSink::default();

        let empty = dir.path().join("empty.zip");
        zip::ZipWriter::new(File::create(&empty)?).finish()?;
        assert!(matches!(
            reader.process_archive(&empty, &mut sink),
            Err(ProcessingError::EmptyArchive(_))
        ));

        let bogus = dir.path().join("bogus.zip");
        std::fs::write(&bogus, "not an archive")?;
        assert!(matches!(
            reader.process_archive(&bogus, &mut sink),
            Err(ProcessingError::Archive(_))
        ));

        assert!(matches!(
            reader.process_archive(&dir.path().join("missing.zip"), &mut sink),
            Err(ProcessingError::Io(_))
        ));
        assert!(sink.batches.is_empty());
        Ok(())
    }
}
