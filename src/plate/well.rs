use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlateError;

/// Longest row label accepted; 1536-well plates need two letters
const MAX_ROW_LETTERS: usize = 3;

/// A well coordinate such as `A01` or `AB12`
///
/// Rows are one to three letters (stored upper-case), columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellId {
    /// Row letters, e.g. `B`
    pub row: String,
    /// 1-based column number
    pub column: u32,
}

impl WellId {
    /// Parse a well name: letters followed by a positive column number
    pub fn parse(name: &str) -> Result<Self, PlateError> {
        let name = name.trim();
        let split = name
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| PlateError::InvalidWell(name.to_string()))?;
        let (letters, digits) = name.split_at(split);

        if letters.is_empty()
            || letters.len() > MAX_ROW_LETTERS
            || digits.is_empty()
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PlateError::InvalidWell(name.to_string()));
        }

        let column: u32 = digits
            .parse()
            .map_err(|_| PlateError::InvalidWell(name.to_string()))?;
        if column == 0 {
            return Err(PlateError::InvalidWell(name.to_string()));
        }

        Ok(Self {
            row: letters.to_ascii_uppercase(),
            column,
        })
    }

    /// 0-based row index (`A` = 0, `Z` = 25, `AA` = 26)
    pub fn row_index(&self) -> u32 {
        self.row
            .bytes()
            .fold(0u32, |acc, b| acc * 26 + (b - b'A') as u32 + 1)
            - 1
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.row, self.column)
    }
}

impl FromStr for WellId {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
