use crate::spreadsheet::range::Range;
use glob::Pattern;

/// Which sheet to read and which part of it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Criteria {
    /// Sheet name pattern; the first sheet in workbook order that matches is read.
    /// `None` selects the first sheet.
    pub(crate) sheet_name_pattern: Option<Pattern>,

    /// Region to extract, first row being the header row.
    pub(crate) range: Range,
}

impl Criteria {
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        self.sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.matches(sheet_name))
            .unwrap_or(true)
    }

    /// Selector text for error messages.
    pub(crate) fn describe_sheet(&self) -> String {
        self.sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.to_string())
            .unwrap_or_else(|| "<first sheet>".to_owned())
    }
}
