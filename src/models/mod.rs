pub mod group;
pub mod header;
pub mod record;

pub use group::Group;
pub use header::Header;
pub use record::Record;
