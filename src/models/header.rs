use std::num::ParseIntError;

/// Number of tokens a header line decodes into.
pub const HEADER_FIELD_COUNT: usize = 11;

/// One sounding launch, decoded from a `#` line.
///
/// Latitude and longitude are kept in the archive's scaled integer form
/// (degrees * 10000).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: String,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub reltime: i32,
    pub numlev: i32,
    pub p_src: String,
    pub np_src: String,
    pub lat: i32,
    pub lon: i32,
}

impl Header {
    /// Build a header from the trimmed tokens of a header line, in layout order.
    ///
    /// The caller guarantees `tokens.len() == HEADER_FIELD_COUNT`.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self, ParseIntError> {
        Ok(Self {
            id: tokens[0].to_string(),
            year: tokens[1].parse()?,
            month: tokens[2].parse()?,
            day: tokens[3].parse()?,
            hour: tokens[4].parse()?,
            reltime: tokens[5].parse()?,
            numlev: tokens[6].parse()?,
            p_src: tokens[7].to_string(),
            np_src: tokens[8].to_string(),
            lat: tokens[9].parse()?,
            lon: tokens[10].parse()?,
        })
    }
}
