pub mod layout;
pub mod line_decoder;

pub use layout::{FieldSpec, LayoutError, LineLayout, Separator, Shape};
pub use line_decoder::{LineDecoder, HEADER_LAYOUT, RECORD_LAYOUT};
