//! Line orderings.
//!
//! Every stage of the sort compares opaque lines through the [`LineOrder`] capability, so the chunk
//! sorter and the mergers never know anything about the record format. Two orderings are built in:
//! [`OrdinalOrder`] (plain byte order) and [`NumberTextOrder`] (the `"<number>. <text>"` record format).

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Separator between the number part and the text part of a record.
pub const SEPARATOR: &str = ". ";

/// Record format error raised while comparing lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The line does not contain the `". "` separator.
    MissingSeparator(String),
    /// The part before the separator is not an integer.
    InvalidNumber(String),
    /// The part after the separator is empty or consists of whitespace only.
    EmptyText(String),
}

impl Error for FormatError {}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            FormatError::MissingSeparator(line) => {
                write!(f, "line {:?} must contain 2 parts delimited by {:?}", line, SEPARATOR)
            }
            FormatError::InvalidNumber(line) => {
                write!(f, "the first part of line {:?} must be an integer number", line)
            }
            FormatError::EmptyText(line) => {
                write!(f, "the second part of line {:?} must not be empty or white space", line)
            }
        }
    }
}

/// Total ordering over line values.
///
/// Comparison is fallible: an ordering that imposes a record format reports malformed lines
/// with a [`FormatError`] instead of guessing their position.
pub trait LineOrder: Send + Sync {
    /// Compares two lines.
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, FormatError>;
}

impl<F> LineOrder for F
where
    F: Fn(&str, &str) -> Result<Ordering, FormatError> + Send + Sync,
{
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, FormatError> {
        self(a, b)
    }
}

/// Plain ordinal (byte-wise) string order. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrdinalOrder;

impl LineOrder for OrdinalOrder {
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, FormatError> {
        Ok(a.cmp(b))
    }
}

/// Order for `"<number>. <text>"` records.
///
/// Text parts are compared ordinally first; equal texts are ordered by their numbers ascending.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberTextOrder;

impl NumberTextOrder {
    /// Splits a record at the first separator into its number and text parts.
    pub fn parse(line: &str) -> Result<(i64, &str), FormatError> {
        let (number, text) = line
            .split_once(SEPARATOR)
            .ok_or_else(|| FormatError::MissingSeparator(line.to_owned()))?;

        let number = number
            .trim()
            .parse::<i64>()
            .map_err(|_| FormatError::InvalidNumber(line.to_owned()))?;

        if text.trim().is_empty() {
            return Err(FormatError::EmptyText(line.to_owned()));
        }

        return Ok((number, text));
    }
}

impl LineOrder for NumberTextOrder {
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, FormatError> {
        let (a_number, a_text) = Self::parse(a)?;
        let (b_number, b_text) = Self::parse(b)?;

        Ok(a_text.cmp(b_text).then(a_number.cmp(&b_number)))
    }
}

/// Reverses the wrapped ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct Descending<O>(pub O);

impl<O: LineOrder> LineOrder for Descending<O> {
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, FormatError> {
        self.0.compare(a, b).map(Ordering::reverse)
    }
}
