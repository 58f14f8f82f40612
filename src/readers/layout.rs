//! Declarative fixed-width line layouts.
//!
//! A [`LineLayout`] is a table of [`FieldSpec`] entries describing, in
//! order, how each field of a line is separated from its predecessor and
//! what characters it may contain. [`LineLayout::extract`] walks any such
//! table over a line and yields one trimmed token per field.
//!
//! Archived files do not always respect the documented column positions, so
//! the walk is driven by field shapes and blank runs rather than by fixed
//! offsets. Columns are only consulted to place a lone optional word.

use thiserror::Error;

/// How a field is separated from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// The field starts immediately after the previous one.
    None,
    /// One or more blanks are required.
    Blanks,
    /// Any run of blanks, possibly empty.
    OptionalBlanks,
}

/// The characters a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Between `min` and `max` non-blank characters.
    Word { min: usize, max: usize },
    /// Up to `max` non-blank characters, or nothing at all.
    OptionalWord { max: usize },
    /// Between `min` and `max` ASCII digits.
    Digits { min: usize, max: usize },
    /// An optional sign followed by 1 to `max_digits` ASCII digits.
    Signed { max_digits: usize },
    /// A single optional ASCII letter.
    Flag,
}

/// One entry of a layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// 1-based start column from the format documentation.
    pub column: usize,
    pub separator: Separator,
    pub shape: Shape,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        column: usize,
        separator: Separator,
        shape: Shape,
    ) -> Self {
        Self {
            name,
            column,
            separator,
            shape,
        }
    }
}

/// An ordered field table, optionally preceded by a one-byte marker.
#[derive(Debug, Clone, Copy)]
pub struct LineLayout {
    pub marker: Option<u8>,
    pub fields: &'static [FieldSpec],
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("line does not start with the expected marker")]
    MissingMarker,

    #[error("missing blank before field '{field}' at column {column}")]
    MissingSeparator { field: &'static str, column: usize },

    #[error("malformed field '{field}' at column {column}")]
    Malformed { field: &'static str, column: usize },

    #[error("unexpected content after the last field at column {column}")]
    TrailingContent { column: usize },
}

impl LineLayout {
    /// Split `line` into one trimmed token per field of the table.
    pub fn extract<'a>(&self, line: &'a str) -> Result<Vec<&'a str>, LayoutError> {
        let bytes = line.as_bytes();
        let mut pos = 0;

        if let Some(marker) = self.marker {
            if bytes.first() != Some(&marker) {
                return Err(LayoutError::MissingMarker);
            }
            pos = 1;
        }

        let mut tokens = Vec::with_capacity(self.fields.len());

        for (index, spec) in self.fields.iter().enumerate() {
            let blanks = count_blanks(bytes, pos);
            let start = match spec.separator {
                Separator::None => pos,
                Separator::Blanks | Separator::OptionalBlanks => pos + blanks,
            };

            if let Shape::OptionalWord { .. } = spec.shape {
                if !self.claims_word(index, bytes, start) {
                    // Leave the blanks for the next field's separator.
                    tokens.push("");
                    continue;
                }
            }

            if spec.separator == Separator::Blanks && blanks == 0 {
                return Err(LayoutError::MissingSeparator {
                    field: spec.name,
                    column: pos + 1,
                });
            }

            let end = scan_shape(spec, bytes, start)?;
            let token = line.get(start..end).ok_or(LayoutError::Malformed {
                field: spec.name,
                column: start + 1,
            })?;

            tokens.push(token.trim());
            pos = end;
        }

        if bytes[pos..].iter().any(|b| !is_blank(*b)) {
            return Err(LayoutError::TrailingContent { column: pos + 1 });
        }

        Ok(tokens)
    }

    /// Decide whether the optional word at `index` takes the next token.
    ///
    /// With at least as many words ahead as there are consecutive optional
    /// word slots, words fill the slots in order. With fewer, a word is only
    /// taken if it starts before the next slot's documented column.
    fn claims_word(&self, index: usize, bytes: &[u8], start: usize) -> bool {
        let words_ahead = count_words(bytes, start);
        if words_ahead == 0 {
            return false;
        }

        let slots = self.fields[index..]
            .iter()
            .take_while(|f| matches!(f.shape, Shape::OptionalWord { .. }))
            .count();
        if words_ahead >= slots {
            return true;
        }

        match self.fields.get(index + 1) {
            Some(next) if matches!(next.shape, Shape::OptionalWord { .. }) => {
                start + 1 < next.column
            }
            _ => true,
        }
    }
}

fn scan_shape(spec: &FieldSpec, bytes: &[u8], start: usize) -> Result<usize, LayoutError> {
    let malformed = LayoutError::Malformed {
        field: spec.name,
        column: start + 1,
    };

    match spec.shape {
        Shape::Word { min, max } => {
            let len = run_length(bytes, start, max, |b| !is_blank(b));
            if len < min {
                return Err(malformed);
            }
            Ok(start + len)
        }
        Shape::OptionalWord { max } => Ok(start + run_length(bytes, start, max, |b| !is_blank(b))),
        Shape::Digits { min, max } => {
            let len = run_length(bytes, start, max, |b| b.is_ascii_digit());
            if len < min {
                return Err(malformed);
            }
            Ok(start + len)
        }
        Shape::Signed { max_digits } => {
            let digits_start = match bytes.get(start) {
                Some(b'-') | Some(b'+') => start + 1,
                _ => start,
            };
            let len = run_length(bytes, digits_start, max_digits, |b| b.is_ascii_digit());
            if len == 0 {
                return Err(malformed);
            }
            Ok(digits_start + len)
        }
        Shape::Flag => match bytes.get(start) {
            Some(b) if b.is_ascii_alphabetic() => Ok(start + 1),
            _ => Ok(start),
        },
    }
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn count_blanks(bytes: &[u8], from: usize) -> usize {
    run_length(bytes, from, usize::MAX, is_blank)
}

fn run_length(bytes: &[u8], from: usize, max: usize, accept: impl Fn(u8) -> bool) -> usize {
    bytes
        .get(from..)
        .unwrap_or_default()
        .iter()
        .take(max)
        .take_while(|b| accept(**b))
        .count()
}

fn is_number(token: &[u8]) -> bool {
    let digits = match token.first() {
        Some(b'-') | Some(b'+') => &token[1..],
        _ => token,
    };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Count consecutive non-numeric tokens starting at `from`.
fn count_words(bytes: &[u8], from: usize) -> usize {
    bytes
        .get(from..)
        .unwrap_or_default()
        .split(|b| is_blank(*b))
        .filter(|token| !token.is_empty())
        .take_while(|token| !is_number(token))
        .count()
}
