/// First character of every header line
pub const HEADER_INDICATOR: char = '#';

/// Unflushed data lines that trigger an intermediate commit
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// Initial capacity of the per-header record buffer
pub const RECORD_CAPACITY_HINT: usize = 500;

/// Worker pool floor
pub const DEFAULT_MIN_WORKERS: usize = 5;

/// File name suffix of input archives
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Database defaults
pub const DEFAULT_DATABASE_PATH: &str = "igra.db";
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 300;
pub const ROW_COUNT_SQL: &str = "select count(*) from igra_data";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
