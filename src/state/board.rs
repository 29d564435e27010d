//! Board geometry: the eleven columns and how many steps each one takes to climb.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest column number on the board.
pub const MIN_COLUMN: u8 = 2;
/// Highest column number on the board.
pub const MAX_COLUMN: u8 = 12;

/// Steps required per column, indexed by `column - MIN_COLUMN`.
///
/// Each value is the number of ordered `(die, die)` pairs summing to the column.
const HEIGHTS: [u8; 11] = [3, 5, 7, 9, 11, 13, 11, 9, 7, 5, 3];

/// Raised when a number outside `2..=12` is used as a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("column {0} is not on the board (expected {MIN_COLUMN}..={MAX_COLUMN})")]
pub struct InvalidColumn(pub u8);

/// One of the numbered tracks players climb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Column(u8);

impl Column {
    /// Build a column, rejecting numbers that are not on the board.
    pub fn new(number: u8) -> Result<Self, InvalidColumn> {
        if (MIN_COLUMN..=MAX_COLUMN).contains(&number) {
            Ok(Self(number))
        } else {
            Err(InvalidColumn(number))
        }
    }

    /// Column named by the sum of two validated die faces.
    ///
    /// Callers guarantee both faces are in `1..=6`.
    pub(crate) const fn from_faces(a: u8, b: u8) -> Self {
        Self(a + b)
    }

    /// Column number as printed on the board.
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Number of steps a player must climb to complete the column.
    pub const fn height(self) -> u8 {
        HEIGHTS[(self.0 - MIN_COLUMN) as usize]
    }

    /// Iterate every column from 2 to 12.
    pub fn all() -> impl Iterator<Item = Column> {
        (MIN_COLUMN..=MAX_COLUMN).map(Column)
    }
}

impl TryFrom<u8> for Column {
    type Error = InvalidColumn;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Column> for u8 {
    fn from(value: Column) -> Self {
        value.0
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Convenience lookup for raw column numbers.
pub fn height(number: u8) -> Result<u8, InvalidColumn> {
    Column::new(number).map(Column::height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_match_two_dice_sum_counts() {
        for column in Column::all() {
            let ways = (1..=6u8)
                .flat_map(|a| (1..=6u8).map(move |b| a + b))
                .filter(|sum| *sum == column.number())
                .count();
            assert_eq!(column.height() as usize, ways, "column {column}");
        }
    }

    #[test]
    fn known_heights() {
        assert_eq!(height(2), Ok(3));
        assert_eq!(height(7), Ok(13));
        assert_eq!(height(12), Ok(3));
    }

    #[test]
    fn off_board_numbers_are_rejected() {
        assert_eq!(Column::new(1), Err(InvalidColumn(1)));
        assert_eq!(Column::new(13), Err(InvalidColumn(13)));
        assert!(height(0).is_err());
    }

    #[test]
    fn serde_rejects_off_board_columns() {
        let column: Column = serde_json::from_str("9").unwrap();
        assert_eq!(column.number(), 9);
        assert!(serde_json::from_str::<Column>("14").is_err());
    }
}
