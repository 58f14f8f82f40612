pub mod reader;

pub use reader::IgraArchiveReader;
