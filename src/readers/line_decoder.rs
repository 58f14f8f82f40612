use crate::models::header::HEADER_FIELD_COUNT;
use crate::models::record::RECORD_FIELD_COUNT;
use crate::models::{Header, Record};
use crate::readers::layout::{FieldSpec, LineLayout, Separator, Shape};
use crate::utils::constants::HEADER_INDICATOR;
use tracing::error;

/*
    Header record layout
    -------------------------------
    Variable        Columns Type
    -------------------------------
    HEADREC       1-  1  Character
    ID            2- 12  Character
    YEAR         14- 17  Integer
    MONTH        19- 20  Integer
    DAY          22- 23  Integer
    HOUR         25- 26  Integer
    RELTIME      28- 31  Integer
    NUMLEV       33- 36  Integer
    P_SRC        38- 45  Character
    NP_SRC       47- 54  Character
    LAT          56- 62  Integer
    LON          64- 71  Integer
    -------------------------------
    #USM00070261 1930 08 26 99 1700    6          cdmp-usm  648161 -1478767
*/
pub static HEADER_LAYOUT: LineLayout = LineLayout {
    marker: Some(HEADER_INDICATOR as u8),
    fields: &[
        FieldSpec::new("id", 2, Separator::None, Shape::Word { min: 11, max: 11 }),
        FieldSpec::new("year", 14, Separator::Blanks, Shape::Digits { min: 4, max: 4 }),
        FieldSpec::new("month", 19, Separator::Blanks, Shape::Digits { min: 2, max: 2 }),
        FieldSpec::new("day", 22, Separator::Blanks, Shape::Digits { min: 2, max: 2 }),
        FieldSpec::new("hour", 25, Separator::Blanks, Shape::Digits { min: 2, max: 2 }),
        FieldSpec::new("reltime", 28, Separator::Blanks, Shape::Digits { min: 1, max: 4 }),
        FieldSpec::new("numlev", 33, Separator::Blanks, Shape::Digits { min: 1, max: 4 }),
        FieldSpec::new("p_src", 38, Separator::Blanks, Shape::OptionalWord { max: 8 }),
        FieldSpec::new("np_src", 47, Separator::Blanks, Shape::OptionalWord { max: 8 }),
        FieldSpec::new("lat", 56, Separator::Blanks, Shape::Signed { max_digits: 7 }),
        FieldSpec::new("lon", 64, Separator::Blanks, Shape::Signed { max_digits: 7 }),
    ],
};

/*
    Data record layout
    -------------------------------
    Variable        Columns Type
    -------------------------------
    LVLTYP1         1-  1   Integer
    LVLTYP2         2-  2   Integer
    ETIME           4-  8   Integer
    PRESS          10- 15   Integer
    PFLAG          16- 16   Character
    GPH            17- 21   Integer
    ZFLAG          22- 22   Character
    TEMP           23- 27   Integer
    TFLAG          28- 28   Character
    RH             29- 33   Integer
    DPDP           35- 39   Integer
    WDIR           41- 45   Integer
    WSPD           47- 51   Integer
    -------------------------------
    10 -9999  40000  6440B -441B-9999 -9999   180   110
    20  9237   1043 30497B -461B    5   392   300   570
*/
pub static RECORD_LAYOUT: LineLayout = LineLayout {
    marker: None,
    fields: &[
        FieldSpec::new("lvltyp1", 1, Separator::None, Shape::Digits { min: 1, max: 1 }),
        FieldSpec::new("lvltyp2", 2, Separator::None, Shape::Digits { min: 1, max: 1 }),
        FieldSpec::new("etime", 4, Separator::Blanks, Shape::Signed { max_digits: 5 }),
        FieldSpec::new("press", 10, Separator::Blanks, Shape::Signed { max_digits: 6 }),
        FieldSpec::new("pflag", 16, Separator::None, Shape::Flag),
        FieldSpec::new("gph", 17, Separator::OptionalBlanks, Shape::Signed { max_digits: 5 }),
        FieldSpec::new("zflag", 22, Separator::None, Shape::Flag),
        FieldSpec::new("temp", 23, Separator::OptionalBlanks, Shape::Signed { max_digits: 5 }),
        FieldSpec::new("tflag", 28, Separator::None, Shape::Flag),
        FieldSpec::new("rh", 29, Separator::OptionalBlanks, Shape::Signed { max_digits: 5 }),
        FieldSpec::new("dpdp", 35, Separator::Blanks, Shape::Signed { max_digits: 5 }),
        FieldSpec::new("wdir", 41, Separator::Blanks, Shape::Signed { max_digits: 5 }),
        FieldSpec::new("wspd", 47, Separator::Blanks, Shape::Signed { max_digits: 5 }),
    ],
};

/// Decodes single IGRA lines. Failures are logged and reported as `None`.
pub struct LineDecoder;

impl LineDecoder {
    pub fn is_header_line(line: &str) -> bool {
        line.starts_with(HEADER_INDICATOR)
    }

    pub fn decode_header(line: &str) -> Option<Header> {
        let tokens = Self::parse(line, &HEADER_LAYOUT, HEADER_FIELD_COUNT)?;

        Header::from_tokens(&tokens)
            .inspect_err(|e| error!(line, error = %e, "Unable to parse header tokens"))
            .ok()
    }

    pub fn decode_record(line: &str) -> Option<Record> {
        let tokens = Self::parse(line, &RECORD_LAYOUT, RECORD_FIELD_COUNT)?;

        Record::from_tokens(&tokens)
            .inspect_err(|e| error!(line, error = %e, "Unable to parse record tokens"))
            .ok()
    }

    /// Split a line into exactly `required_tokens` trimmed tokens.
    pub fn parse<'a>(
        line: &'a str,
        layout: &LineLayout,
        required_tokens: usize,
    ) -> Option<Vec<&'a str>> {
        match layout.extract(line) {
            Ok(tokens) if tokens.len() == required_tokens => Some(tokens),
            Ok(tokens) => {
                error!(
                    line,
                    expected = required_tokens,
                    found = tokens.len(),
                    "Unexpected token count"
                );
                None
            }
            Err(e) => {
                error!(line, error = %e, "Unknown line format");
                None
            }
        }
    }
}
