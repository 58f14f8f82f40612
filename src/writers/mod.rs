pub mod schema;
pub mod sqlite_writer;

pub use schema::{create_database, query_results};
pub use sqlite_writer::{open_connection, SqliteWriter};

use crate::error::Result;
use crate::models::Group;

/// Outcome of persisting one batch of groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records contained in the batch, whether or not they were written.
    pub rows: usize,
    /// Rows dropped because they could not be bound or inserted.
    pub skipped: usize,
}

/// Destination for batches of decoded groups.
pub trait BatchSink {
    fn save_batch(&mut self, groups: &[Group]) -> Result<BatchReport>;
}
