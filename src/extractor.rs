//! The Extractor: one workbook region republished as a CSV artifact.

use crate::artifact;
use crate::error::FeedError;
use crate::error::ResultMessage;
use crate::error::WorkbookError;
use crate::record;
use crate::record::RecordSet;
use crate::scheduler::Job;
use crate::scheduler::Tick;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::range::Range;
use glob::Pattern;
use log::debug;
use log::info;
use std::path::Path;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    /// Source workbook (`.xlsx`, `.xlsm`, `.xlam` or `.ods`)
    pub workbook: PathBuf,
    /// CSV artifact path
    pub output: PathBuf,
    /// Sheet name glob; the first sheet when `None`
    pub sheet: Option<String>,
    /// A1-style region whose first row holds the headers; the whole sheet when `None`
    pub range: Option<String>,
    /// Copy the workbook into memory before parsing
    pub snapshot: bool,
}

/// Outcome of a successful extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractReport {
    pub columns: usize,
    pub rows: usize,
    pub output: PathBuf,
}

pub struct Extractor {
    workbook: PathBuf,
    output: PathBuf,
    criteria: Criteria,
    snapshot: bool,
}

impl Extractor {
    /// Validates the sheet pattern and range up front so that configuration
    /// mistakes surface before the first tick.
    pub fn new(config: ExtractorConfig) -> Result<Extractor, FeedError> {
        let sheet_name_pattern = config
            .sheet
            .as_deref()
            .map(Pattern::new)
            .transpose()
            .map_err(|error| FeedError::Config(format!("sheet pattern: {error}")))?;
        let range = config
            .range
            .as_deref()
            .map(|range| Range::try_from(range))
            .transpose()
            .map_err(|error| FeedError::Config(format!("range: {error}")))?
            .unwrap_or_default();
        Ok(Extractor {
            workbook: config.workbook,
            output: config.output,
            criteria: Criteria {
                sheet_name_pattern,
                range,
            },
            snapshot: config.snapshot,
        })
    }

    pub fn workbook(&self) -> &Path {
        &self.workbook
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Reads the configured region without touching the artifact.
    pub fn read_records(&self) -> Result<RecordSet, FeedError> {
        if !self.workbook.is_file() {
            return Err(FeedError::SourceNotFound(self.workbook.to_owned()));
        }
        self.load_records()
            .map_err(|error| FeedError::extraction(self.workbook.to_owned(), error))
    }

    /// Reads the region, renders it and replaces the artifact.
    /// On any error the previous artifact is left as it was.
    pub fn extract(&self) -> Result<ExtractReport, FeedError> {
        let records = self.read_records()?;
        let content = artifact::render(&records)
            .map_err(|error| FeedError::extraction(self.workbook.to_owned(), error))?;
        artifact::publish(&self.output, &content)
            .map_err(WorkbookError::from)
            .with_prefix(&format!("write '{}'", self.output.display()))
            .map_err(|error| FeedError::extraction(self.workbook.to_owned(), error))?;

        Ok(ExtractReport {
            columns: records.headers().len(),
            rows: records.len(),
            output: self.output.to_owned(),
        })
    }

    fn load_records(&self) -> Result<RecordSet, WorkbookError> {
        // The workbook handle is released when `spreadsheet` goes out of scope
        let sheet = {
            let mut spreadsheet = open_spreadsheet(&self.workbook, self.snapshot)?;
            let sheet = spreadsheet.read_sheet(&self.criteria)?;
            debug!(
                "Read {} cells from sheet '{}' of '{}'",
                sheet.cells.len(),
                sheet.name,
                spreadsheet.name()
            );
            sheet
        };
        record::from_sheet(&sheet)
    }
}

impl Job for Extractor {
    fn run(&self, tick: &Tick) -> Result<(), FeedError> {
        let report = self.extract()?;
        info!(
            "Tick {}: published {} rows x {} columns to '{}'",
            tick.sequence,
            report.rows,
            report.columns,
            report.output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sheet: Option<&str>, range: Option<&str>) -> ExtractorConfig {
        ExtractorConfig {
            workbook: PathBuf::from("book.xlsx"),
            output: PathBuf::from("feed.csv"),
            sheet: sheet.map(str::to_owned),
            range: range.map(str::to_owned),
            snapshot: true,
        }
    }

    #[test]
    fn rejects_invalid_range() {
        let error = Extractor::new(config(None, Some("A9:B2"))).err().unwrap();
        assert!(matches!(error, FeedError::Config(ref message) if message.starts_with("range:")));
    }

    #[test]
    fn rejects_invalid_sheet_pattern() {
        let error = Extractor::new(config(Some("Sheet[1"), None)).err().unwrap();
        assert!(matches!(error, FeedError::Config(ref message) if message.starts_with("sheet pattern:")));
    }

    #[test]
    fn keeps_configured_paths() {
        let extractor = Extractor::new(config(None, None)).unwrap();
        assert_eq!(extractor.workbook(), Path::new("book.xlsx"));
        assert_eq!(extractor.output(), Path::new("feed.csv"));
    }

    #[test]
    fn missing_workbook_is_source_not_found() {
        let extractor = Extractor::new(config(Some("Sheet1"), Some("A1:C18"))).unwrap();
        let error = extractor.extract().unwrap_err();
        assert!(matches!(error, FeedError::SourceNotFound(ref path) if path == Path::new("book.xlsx")));
    }
}
