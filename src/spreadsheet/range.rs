use crate::error::WorkbookError;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),

    #[error("Range '{0}' ends before it starts")]
    BoundsError(String),
}

/// Sheet region with optional bounds, all 0-based and inclusive.
/// The first row of the region is the header row.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct Range {
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl TryFrom<&str> for Range {
    type Error = WorkbookError;

    /// Parses an A1-style region: `A1:F18`, `1:18`, `B:D`, `B3:`, `:F18`, `A1`.
    /// A single reference selects everything from that cell onwards.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern");
        let value = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(value.as_str())
            .filter(|_| !value.is_empty() && value != ":")
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let part = |index: usize| captures.get(index).map(|matcher| matcher.as_str()).unwrap_or("");
        let range = Range {
            col_lower_bound: col_to_index(part(1)),
            row_lower_bound: row_to_index(part(2)),
            col_upper_bound: col_to_index(part(4)),
            row_upper_bound: row_to_index(part(5)),
        };
        if (!part(2).is_empty() && range.row_lower_bound.is_none())
            || (!part(5).is_empty() && range.row_upper_bound.is_none())
        {
            Err(RangeError::FormatError(value.to_owned()))?;
        }
        let rows_reversed = range.row_lower_bound.zip(range.row_upper_bound).map(|(lower, upper)| upper < lower);
        let cols_reversed = range.col_lower_bound.zip(range.col_upper_bound).map(|(lower, upper)| upper < lower);
        if rows_reversed.unwrap_or(false) || cols_reversed.unwrap_or(false) {
            Err(RangeError::BoundsError(value.to_owned()))?;
        }
        Ok(range)
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = |row: Option<usize>, col: Option<usize>| match (row, col) {
            (Some(row), Some(col)) => index_to_reference(row, col),
            (Some(row), None) => (row + 1).to_string(),
            (None, Some(col)) => index_to_reference(0, col).trim_end_matches('1').to_owned(),
            (None, None) => String::new(),
        };
        write!(
            f,
            "{}:{}",
            side(self.row_lower_bound, self.col_lower_bound),
            side(self.row_upper_bound, self.col_upper_bound)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> Range {
        Range::try_from(value).unwrap()
    }

    #[test]
    fn full_range() {
        assert_eq!(
            parse("a1:f18"),
            Range {
                row_lower_bound: Some(0),
                row_upper_bound: Some(17),
                col_lower_bound: Some(0),
                col_upper_bound: Some(5),
            }
        );
    }

    #[test]
    fn partial_ranges() {
        assert_eq!(
            parse("1:18"),
            Range {
                row_lower_bound: Some(0),
                row_upper_bound: Some(17),
                ..Range::default()
            }
        );
        assert_eq!(
            parse("B3:"),
            Range {
                row_lower_bound: Some(2),
                col_lower_bound: Some(1),
                ..Range::default()
            }
        );
        assert_eq!(
            parse("B:D"),
            Range {
                col_lower_bound: Some(1),
                col_upper_bound: Some(3),
                ..Range::default()
            }
        );
        assert_eq!(parse("C5").row_upper_bound, None);
    }

    #[test]
    fn invalid_ranges() {
        assert!(Range::try_from("").is_err());
        assert!(Range::try_from(":").is_err());
        assert!(Range::try_from("A0:B2").is_err());
        assert!(Range::try_from("1-18").is_err());
        assert!(matches!(
            Range::try_from("A18:A1"),
            Err(WorkbookError::RangeError(RangeError::BoundsError(_)))
        ));
        assert!(matches!(
            Range::try_from("D1:B5"),
            Err(WorkbookError::RangeError(RangeError::BoundsError(_)))
        ));
    }

    #[test]
    fn display() {
        assert_eq!(parse("a1:f18").to_string(), "A1:F18");
        assert_eq!(parse("1:18").to_string(), "1:18");
        assert_eq!(parse("B:D").to_string(), "B:D");
        assert_eq!(parse("B3").to_string(), "B3:");
    }
}
