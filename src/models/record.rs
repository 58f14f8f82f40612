use std::num::ParseIntError;

/// Number of tokens a data line decodes into.
pub const RECORD_FIELD_COUNT: usize = 13;

/// One vertical level of a sounding.
///
/// Values are stored exactly as archived, so the missing (-9999) and
/// removed (-8888) sentinels pass through untouched. Flags are a single
/// letter or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub lvltyp1: i32,
    pub lvltyp2: i32,
    pub etime: i32,
    pub press: i32,
    pub pflag: String,
    pub gph: i32,
    pub zflag: String,
    pub temp: i32,
    pub tflag: String,
    pub rh: i32,
    pub dpdp: i32,
    pub wdir: i32,
    pub wspd: i32,
}

impl Record {
    /// Build a record from the trimmed tokens of a data line, in layout order.
    ///
    /// The caller guarantees `tokens.len() == RECORD_FIELD_COUNT`.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self, ParseIntError> {
        Ok(Self {
            lvltyp1: tokens[0].parse()?,
            lvltyp2: tokens[1].parse()?,
            etime: tokens[2].parse()?,
            press: tokens[3].parse()?,
            pflag: tokens[4].to_string(),
            gph: tokens[5].parse()?,
            zflag: tokens[6].to_string(),
            temp: tokens[7].parse()?,
            tflag: tokens[8].to_string(),
            rh: tokens[9].parse()?,
            dpdp: tokens[10].parse()?,
            wdir: tokens[11].parse()?,
            wspd: tokens[12].parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tokens_keeps_sentinels() {
        let tokens = [
            "3", "0", "-9999", "-9999", "", "250", "", "-9999", "", "-9999", "-9999", "90", "20",
        ];
        let record = Record::from_tokens(&tokens).unwrap();

        assert_eq!(record.lvltyp1, 3);
        assert_eq!(record.etime, -9999);
        assert_eq!(record.press, -9999);
        assert_eq!(record.gph, 250);
        assert_eq!(record.pflag, "");
        assert_eq!(record.wspd, 20);
    }

    #[test]
    fn test_from_tokens_rejects_empty_number() {
        let tokens = ["1", "0", "", "100000", "B", "213", "B", "-228", "B", "738", "34", "49", "11"];
        assert!(Record::from_tokens(&tokens).is_err());
    }
}
