use crate::models::{Header, Record};

/// A header together with the data lines that followed it, in file order.
///
/// `header` is `None` when the stream began with data lines or when the
/// header line failed to decode; such groups still carry their records so
/// that the persister can account for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub header: Option<Header>,
    pub records: Vec<Record>,
}

impl Group {
    pub fn new(header: Option<Header>, records: Vec<Record>) -> Self {
        Self { header, records }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Total number of records across a slice of groups.
pub fn total_records(groups: &[Group]) -> usize {
    groups.iter().map(Group::record_count).sum()
}
