pub mod load_report;
pub mod parallel_processor;

pub use load_report::{FileSummary, LineCounts, LoadReport};
pub use parallel_processor::{discover_archives, pool_size, process_file, ParallelProcessor};
