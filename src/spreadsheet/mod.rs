//! Workbook readers for the zipped spreadsheet formats.
//!
//! Each format implements [`Spreadsheet`], which yields one [`sheet::Sheet`]
//! holding the non-empty cells of the requested region.
pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod ods;
pub(crate) mod range;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::WorkbookError;
use crate::helpers::reader::WorkbookReader;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported file format: '{0}'")]
    FileFormatError(String),

    #[error("Missing workbook part: '{0}'")]
    FileError(String),

    #[error("Spreadsheet is password protected: '{0}'")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet has no sheets: '{0}'")]
    SpreadsheetEmptyError(String),

    #[error("No sheet in '{0}' matches '{1}'")]
    SheetNotFoundError(String, String),

    #[error("Sheet '{1}' in '{0}' has no header row")]
    MissingHeaderRowError(String, String),

    #[error("Cell {0} refers to missing shared string {1}")]
    SharedStringError(String, usize),

    #[error("Invalid value in '{0}' sheet '{1}' cell {2}: {3}")]
    CellValueError(String, String, String, String),
}

pub(crate) trait Spreadsheet {
    fn name(&self) -> String;

    /// Reads the first sheet accepted by `criteria`, keeping only cells in its range.
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, WorkbookError>;
}

/// Opens a workbook, choosing the reader by file extension.
///
/// With `snapshot` the whole file is read into memory first, so the workbook
/// stays consistent even if it is rewritten while being parsed.
pub(crate) fn open_spreadsheet(path: &Path, snapshot: bool) -> Result<Box<dyn Spreadsheet>, WorkbookError> {
    let file_name = path.to_string_lossy().to_string();
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlam" => {
            let reader = WorkbookReader::open(path, snapshot)?;
            Ok(Box::new(XlsxSpreadsheet::open(&file_name, reader)?))
        }
        "ods" => {
            let reader = WorkbookReader::open(path, snapshot)?;
            Ok(Box::new(OdsSpreadsheet::open(&file_name, reader)?))
        }
        _ => Err(SpreadsheetError::FileFormatError(file_name).into()),
    }
}
