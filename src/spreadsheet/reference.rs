//! Conversions between Excel-style references (`AA`, `B12`) and 1-based numeric coordinates.

use crate::spreadsheet::range::RangeError;
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

/// Last row of a worksheet
pub const MAX_ROWS: usize = 1_048_576;
/// Last column of a worksheet (`XFD`)
pub const MAX_COLS: usize = 16_384;

static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").expect("Hardcode regex pattern"));

/// Converts column letters to a 1-based column number: A = 1, Z = 26, AA = 27.
/// Letters are case-insensitive; columns past `XFD` are rejected.
pub fn col_to_index(letters: &str) -> Result<usize, RangeError> {
    if letters.is_empty() {
        Err(RangeError::InvalidAddress(letters.to_owned()))?
    }
    letters.chars().try_fold(0usize, |index, letter| {
        if !letter.is_ascii_alphabetic() {
            return Err(RangeError::InvalidAddress(letters.to_owned()));
        }
        let digit = (letter.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        index
            .checked_mul(26)
            .and_then(|index| index.checked_add(digit))
            .filter(|index| *index <= MAX_COLS)
            .ok_or_else(|| RangeError::InvalidAddress(letters.to_owned()))
    })
}

/// Converts a 1-based column number back to its upper-case letters.
pub fn index_to_col(index: usize) -> Result<String, RangeError> {
    if index < 1 {
        Err(RangeError::InvalidAddress(index.to_string()))?
    }
    let mut column = index;
    let mut letters = Vec::new();
    while column > 0 {
        column -= 1;
        letters.push(char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    Ok(letters.into_iter().rev().collect())
}

/// Formats a 1-based (row, col) pair as a reference such as `B12`.
pub fn index_to_reference(row: usize, col: usize) -> String {
    let letters = index_to_col(col).unwrap_or_default();
    format!("{letters}{row}")
}

/// Parses the `r` attribute of a worksheet cell into a 1-based (row, col) pair.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    CellAddress::try_from(reference)
        .ok()
        .map(|address| (address.row, address.col))
}

/// A single cell position, both coordinates 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub col: usize,
    pub row: usize,
}

impl TryFrom<&str> for CellAddress {
    type Error = RangeError;

    /// Parses an address like `B12` (letters then digits, nothing else) within `XFD1048576`.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let captures = ADDRESS_PATTERN
            .captures(value)
            .ok_or_else(|| RangeError::InvalidAddress(value.to_owned()))?;
        let col = col_to_index(&captures[1])?;
        let row = captures[2]
            .parse::<usize>()
            .ok()
            .filter(|row| (1..=MAX_ROWS).contains(row))
            .ok_or_else(|| RangeError::InvalidAddress(value.to_owned()))?;
        Ok(CellAddress { col, row })
    }
}

impl Display for CellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", index_to_reference(self.row, self.col))
    }
}
